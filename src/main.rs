mod config;
mod report;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use commit_graph::{Analysis, BranchPolicy, CommitSource, GitWalker, PipelineOptions};
use config::Config;
use gitcycle_query::{DpllSolver, FactSet, Pattern, PatternQuery, Solver};
use report::{Format, PatternOutcome, Report};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "gitcycle")]
#[command(about = "Find structural patterns in the commit graph of a git repository", long_about = None)]
struct Cli {
    /// Raise log verbosity (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Config file (defaults to <repo>/.gitcycle.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build, condense and query the commit graph
    Analyze {
        #[command(flatten)]
        graph: GraphArgs,
        /// Pattern to check (repeatable)
        #[arg(short, long = "pattern")]
        patterns: Vec<Pattern>,
        /// Backend that decides the patterns
        #[arg(long, value_enum, default_value_t = SolverArg::Dpll)]
        solver: SolverArg,
        /// Solver decision budget per pattern (dpll only)
        #[arg(long)]
        max_decisions: Option<u64>,
        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
    /// List the edges of the condensed graph with their multiplicity
    Pairs {
        #[command(flatten)]
        graph: GraphArgs,
        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
    /// List the references that would be walked
    Refs {
        #[command(flatten)]
        graph: GraphArgs,
    },
    /// Print the solver formula for a pattern
    Formula {
        #[command(flatten)]
        graph: GraphArgs,
        /// Pattern to render
        #[arg(short, long, default_value = "maintenance-cycle")]
        pattern: Pattern,
    },
}

#[derive(Args)]
struct GraphArgs {
    /// Path to the repository
    #[arg(default_value = ".")]
    path: PathBuf,
    /// Classification policy for branching and merging nodes
    #[arg(long, value_enum)]
    policy: Option<PolicyArg>,
    /// Walk tags as well as branches
    #[arg(long)]
    include_tags: bool,
    /// Skip a reference by name, or every reference under a `prefix/`
    #[arg(long)]
    exclude: Vec<String>,
    /// Abort when the history has more than this many commits
    #[arg(long)]
    max_commits: Option<usize>,
}

#[derive(Clone, Copy, ValueEnum)]
enum PolicyArg {
    DegreeOnly,
    RequireOpposite,
}

impl From<PolicyArg> for BranchPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::DegreeOnly => BranchPolicy::DegreeOnly,
            PolicyArg::RequireOpposite => BranchPolicy::RequireOpposite,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum SolverArg {
    Dpll,
    Z3,
}

fn solver(kind: SolverArg, max_decisions: u64) -> Result<Box<dyn Solver>> {
    match kind {
        SolverArg::Dpll => Ok(Box::new(DpllSolver::new(max_decisions))),
        #[cfg(feature = "z3")]
        SolverArg::Z3 => Ok(Box::new(gitcycle_query::Z3Solver::new())),
        #[cfg(not(feature = "z3"))]
        SolverArg::Z3 => anyhow::bail!("gitcycle was built without the `z3` feature"),
    }
}

impl GraphArgs {
    /// Pipeline options from the config file with command line overrides
    fn options(&self, config: &Config) -> PipelineOptions {
        let mut filter = config.refs.filter.clone();
        if self.include_tags {
            filter.exclude_tags = false;
        }
        filter.exclude.extend(self.exclude.iter().cloned());

        PipelineOptions {
            filter,
            max_commits: self.max_commits.or(config.refs.max_commits),
            policy: self.policy.map(BranchPolicy::from).unwrap_or(config.classify.policy),
        }
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .init();
}

fn open(path: &Path) -> Result<GitWalker> {
    GitWalker::new(Some(path))
        .with_context(|| format!("Failed to open repository at {}", path.display()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Analyze {
            graph,
            patterns,
            solver: kind,
            max_decisions,
            format,
        } => {
            let config = config::load(&graph.path, cli.config.as_deref())?;
            let options = graph.options(&config);
            let walker = open(&graph.path)?;

            let analysis = Analysis::run(&walker, &options).context("Failed to analyze commit graph")?;

            let patterns = if patterns.is_empty() {
                config.query.patterns.clone()
            } else {
                patterns
            };
            let facts = FactSet::from_topology(analysis.dag(), analysis.topology(), analysis.policy())?;
            let mut solver = solver(kind, max_decisions.unwrap_or(config.query.max_decisions))?;
            let outcomes = patterns
                .into_iter()
                .map(|pattern| PatternOutcome {
                    pattern,
                    verdict: PatternQuery::new(&facts, pattern).run(solver.as_mut()),
                })
                .collect();

            let report = Report::new(graph.path.display().to_string(), &analysis, outcomes);
            println!("{}", report.render(format)?);
        }
        Commands::Pairs { graph, format } => {
            let config = config::load(&graph.path, cli.config.as_deref())?;
            let options = graph.options(&config);
            let walker = open(&graph.path)?;

            let analysis = Analysis::run(&walker, &options).context("Failed to analyze commit graph")?;
            let rows = report::pair_rows(&analysis)?;
            println!("{}", report::render_pairs(&rows, format)?);
        }
        Commands::Refs { graph } => {
            let config = config::load(&graph.path, cli.config.as_deref())?;
            let options = graph.options(&config);
            let walker = open(&graph.path)?;

            let all = walker.references()?;
            let total = all.len();
            let selected = options.filter.select(all);
            info!(total, selected = selected.len(), "listed references");
            for reference in selected {
                println!("{}", reference.name);
            }
        }
        Commands::Formula { graph, pattern } => {
            let config = config::load(&graph.path, cli.config.as_deref())?;
            let options = graph.options(&config);
            let walker = open(&graph.path)?;

            let analysis = Analysis::run(&walker, &options).context("Failed to analyze commit graph")?;
            let facts = FactSet::from_topology(analysis.dag(), analysis.topology(), analysis.policy())?;
            println!("{}", PatternQuery::new(&facts, pattern).formula());
        }
    }

    Ok(())
}
