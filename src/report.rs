use commit_graph::{Analysis, BranchPolicy, BuildStats, Category, CommitId, CondenseReport, GraphSummary, Shape};
use gitcycle_query::{Pattern, Verdict};
use serde::Serialize;
use std::fmt;

/// Output format of the analysis report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Format {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatternOutcome {
    pub pattern: Pattern,
    #[serde(flatten)]
    pub verdict: Verdict,
}

/// Everything printed for one repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub repository: String,
    pub policy: BranchPolicy,
    pub build: BuildStats,
    pub original: GraphSummary,
    pub condensation: CondenseReport,
    pub condensed: GraphSummary,
    pub patterns: Vec<PatternOutcome>,
}

impl Report {
    pub fn new(repository: impl Into<String>, analysis: &Analysis, patterns: Vec<PatternOutcome>) -> Self {
        Self {
            repository: repository.into(),
            policy: analysis.policy(),
            build: analysis.build_stats().clone(),
            original: analysis.original().clone(),
            condensation: analysis.condense_report().clone(),
            condensed: analysis.condensed().clone(),
            patterns,
        }
    }

    pub fn render(&self, format: Format) -> serde_json::Result<String> {
        match format {
            Format::Text => Ok(self.to_string()),
            Format::Json => serde_json::to_string_pretty(self),
        }
    }
}

fn summary_row(f: &mut fmt::Formatter<'_>, label: &str, summary: &GraphSummary) -> fmt::Result {
    write!(f, "{label:<10} {:>8} {:>8}", summary.nodes, summary.edges)?;
    for category in Category::ALL {
        write!(f, " {:>11}", summary.categories.get(category))?;
    }
    writeln!(f)
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Repository: {}", self.repository)?;
        writeln!(
            f,
            "References: {} walked, {} commit visits, {} resolved past the walk",
            self.build.references, self.build.visits, self.build.lazily_resolved
        )?;
        writeln!(f)?;

        write!(f, "{:<10} {:>8} {:>8}", "", "nodes", "edges")?;
        for category in Category::ALL {
            write!(f, " {:>11}", category.as_str())?;
        }
        writeln!(f)?;
        summary_row(f, "original", &self.original)?;
        summary_row(f, "condensed", &self.condensed)?;
        writeln!(f)?;

        writeln!(
            f,
            "Condensation: {} sequential commits removed in {} passes, {} parallel pairs",
            self.condensation.removed, self.condensation.passes, self.condensation.parallel_pairs
        )?;

        if !self.patterns.is_empty() {
            writeln!(f)?;
            for outcome in &self.patterns {
                writeln!(f, "{:<18} {}", outcome.pattern.name(), outcome.verdict)?;
            }
        }
        Ok(())
    }
}

/// One distinct edge of the condensed graph with the shapes of its ends
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PairRow {
    pub parent: CommitId,
    pub parent_shape: Vec<&'static str>,
    pub child: CommitId,
    pub child_shape: Vec<&'static str>,
    pub multiplicity: usize,
}

fn labels(shape: Shape) -> Vec<&'static str> {
    Category::ALL
        .into_iter()
        .filter(|&category| shape.has(category))
        .map(|category| category.as_str())
        .collect()
}

/// Condensed edges in stream order
pub fn pair_rows(analysis: &Analysis) -> commit_graph::Result<Vec<PairRow>> {
    let policy = analysis.policy();
    analysis
        .edges()
        .map(|edge| {
            edge.map(|edge| PairRow {
                parent: edge.parent.id.clone(),
                parent_shape: labels(edge.parent.shape(policy)),
                child: edge.child.id.clone(),
                child_shape: labels(edge.child.shape(policy)),
                multiplicity: edge.multiplicity,
            })
        })
        .collect()
}

pub fn render_pairs(rows: &[PairRow], format: Format) -> serde_json::Result<String> {
    match format {
        Format::Json => serde_json::to_string_pretty(rows),
        Format::Text => Ok(rows
            .iter()
            .map(|row| {
                format!(
                    "{:<8} {:<30} -> {:<8} {:<30} x{}",
                    row.parent.short(),
                    format!("[{}]", row.parent_shape.join(",")),
                    row.child.short(),
                    format!("[{}]", row.child_shape.join(",")),
                    row.multiplicity
                )
                .trim_end()
                .to_string()
            })
            .collect::<Vec<_>>()
            .join("\n")),
    }
}
