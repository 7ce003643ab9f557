use serde::{Deserialize, Serialize};

/// How branching/merging treat the opposite side of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BranchPolicy {
    /// branching iff children > 1, merging iff parents > 1
    #[default]
    DegreeOnly,
    /// additionally require at least one edge on the opposite side
    RequireOpposite,
}

/// Topology categories of a node, derived from its degree counts.
///
/// Categories overlap except `sequential` and `structural`, which exclude
/// each other arithmetically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Shape {
    pub terminal: bool,
    pub sequential: bool,
    pub structural: bool,
    pub branching: bool,
    pub merging: bool,
}

impl Shape {
    pub fn from_degrees(parents: usize, children: usize, policy: BranchPolicy) -> Self {
        let (branching, merging) = match policy {
            BranchPolicy::DegreeOnly => (children > 1, parents > 1),
            BranchPolicy::RequireOpposite => {
                (children > 1 && parents >= 1, parents > 1 && children >= 1)
            }
        };

        Self {
            terminal: parents == 0 || children == 0,
            sequential: parents == 1 && children == 1,
            structural: parents + children > 2,
            branching,
            merging,
        }
    }

    pub fn has(&self, category: Category) -> bool {
        match category {
            Category::Terminal => self.terminal,
            Category::Sequential => self.sequential,
            Category::Structural => self.structural,
            Category::Branching => self.branching,
            Category::Merging => self.merging,
        }
    }
}

/// One classification category, used to name facts and count nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Terminal,
    Sequential,
    Structural,
    Branching,
    Merging,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Terminal,
        Category::Sequential,
        Category::Structural,
        Category::Branching,
        Category::Merging,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Terminal => "terminal",
            Category::Sequential => "sequential",
            Category::Structural => "structural",
            Category::Branching => "branching",
            Category::Merging => "merging",
        }
    }
}
