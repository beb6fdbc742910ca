/// One step of a line-level edit script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffOp {
    Unchanged(String),
    Removed(String),
    Added(String),
}

impl DiffOp {
    pub fn line(&self) -> &str {
        match self {
            DiffOp::Unchanged(line) | DiffOp::Removed(line) | DiffOp::Added(line) => line,
        }
    }

    pub fn is_change(&self) -> bool {
        !matches!(self, DiffOp::Unchanged(_))
    }
}

/// Added and removed lines of an edit script, in script order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    pub removed: Vec<String>,
    pub added: Vec<String>,
}

impl ChangeSet {
    pub fn between(old: &str, new: &str) -> Self {
        Self::from_ops(&compute_diff(old, new))
    }

    pub fn from_ops(ops: &[DiffOp]) -> Self {
        let mut changes = Self::default();
        for op in ops {
            match op {
                DiffOp::Removed(line) => changes.removed.push(line.clone()),
                DiffOp::Added(line) => changes.added.push(line.clone()),
                DiffOp::Unchanged(_) => {}
            }
        }
        changes
    }

    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.added.is_empty()
    }
}

pub fn split_lines(text: &str) -> Vec<&str> {
    if text.is_empty() {
        Vec::new()
    } else {
        text.split('\n').collect()
    }
}

/// Upper bound on LCS table cells (4 bytes each) before the diff switches to
/// linear-space divide and conquer.
const MAX_TABLE_CELLS: usize = 4_000_000;

/// Minimal line edit script from `old` to `new`, computed from the longest
/// common subsequence. When alignments tie, removals from `old` come before
/// additions from `new`.
pub fn compute_diff(old: &str, new: &str) -> Vec<DiffOp> {
    compute_diff_bounded(old, new, MAX_TABLE_CELLS)
}

fn compute_diff_bounded(old: &str, new: &str, max_cells: usize) -> Vec<DiffOp> {
    let a = split_lines(old);
    let b = split_lines(new);

    // Common head and tail never change the LCS length; trimming them keeps
    // the table small for the usual case of a localized edit.
    let prefix = a.iter().zip(&b).take_while(|(x, y)| x == y).count();
    let suffix = a[prefix..]
        .iter()
        .rev()
        .zip(b[prefix..].iter().rev())
        .take_while(|(x, y)| x == y)
        .count();

    let mut ops = Vec::with_capacity(a.len().max(b.len()));
    ops.extend(a[..prefix].iter().map(|line| DiffOp::Unchanged(line.to_string())));
    diff_middle(
        &a[prefix..a.len() - suffix],
        &b[prefix..b.len() - suffix],
        max_cells,
        &mut ops,
    );
    ops.extend(
        a[a.len() - suffix..]
            .iter()
            .map(|line| DiffOp::Unchanged(line.to_string())),
    );
    ops
}

/// Hirschberg split: halve `a`, find where the optimal path crosses the
/// midpoint using two LCS rows, and recurse on both halves. A single-line
/// side keeps the full table, which is linear in that case.
fn diff_middle(a: &[&str], b: &[&str], max_cells: usize, ops: &mut Vec<DiffOp>) {
    let (n, m) = (a.len(), b.len());
    if n < 2 || m < 2 || (n + 1).saturating_mul(m + 1) <= max_cells {
        diff_table(a, b, ops);
        return;
    }

    let mid = n / 2;
    let head = lcs_prefix_row(&a[..mid], b);
    let tail = lcs_suffix_row(&a[mid..], b);
    // Smallest crossing column: old lines are consumed before new ones.
    let (split, _) = head
        .iter()
        .zip(&tail)
        .map(|(h, t)| h + t)
        .enumerate()
        .fold((0, 0), |best, (k, total)| if total > best.1 { (k, total) } else { best });

    diff_middle(&a[..mid], &b[..split], max_cells, ops);
    diff_middle(&a[mid..], &b[split..], max_cells, ops);
}

/// `row[j]` = LCS length of `a` and `b[..j]`.
fn lcs_prefix_row(a: &[&str], b: &[&str]) -> Vec<u32> {
    let mut prev = vec![0u32; b.len() + 1];
    let mut cur = vec![0u32; b.len() + 1];
    for x in a {
        for j in 1..=b.len() {
            cur[j] = if *x == b[j - 1] {
                prev[j - 1] + 1
            } else {
                prev[j].max(cur[j - 1])
            };
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    prev
}

/// `row[j]` = LCS length of `a` and `b[j..]`.
fn lcs_suffix_row(a: &[&str], b: &[&str]) -> Vec<u32> {
    let m = b.len();
    let mut prev = vec![0u32; m + 1];
    let mut cur = vec![0u32; m + 1];
    for x in a.iter().rev() {
        for j in (0..m).rev() {
            cur[j] = if *x == b[j] {
                prev[j + 1] + 1
            } else {
                prev[j].max(cur[j + 1])
            };
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    prev
}

fn diff_table(a: &[&str], b: &[&str], ops: &mut Vec<DiffOp>) {
    let (n, m) = (a.len(), b.len());
    let width = m + 1;
    // lcs[i * width + j] = LCS length of a[i..] and b[j..]
    let mut lcs = vec![0u32; (n + 1) * width];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            lcs[i * width + j] = if a[i] == b[j] {
                lcs[(i + 1) * width + j + 1] + 1
            } else {
                lcs[(i + 1) * width + j].max(lcs[i * width + j + 1])
            };
        }
    }

    let (mut i, mut j) = (0, 0);
    while i < n && j < m {
        if a[i] == b[j] {
            ops.push(DiffOp::Unchanged(a[i].to_string()));
            i += 1;
            j += 1;
        } else if lcs[(i + 1) * width + j] >= lcs[i * width + j + 1] {
            ops.push(DiffOp::Removed(a[i].to_string()));
            i += 1;
        } else {
            ops.push(DiffOp::Added(b[j].to_string()));
            j += 1;
        }
    }
    ops.extend(a[i..].iter().map(|line| DiffOp::Removed(line.to_string())));
    ops.extend(b[j..].iter().map(|line| DiffOp::Added(line.to_string())));
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn rebuild_old(ops: &[DiffOp]) -> Vec<&str> {
        ops.iter()
            .filter(|op| !matches!(op, DiffOp::Added(_)))
            .map(DiffOp::line)
            .collect()
    }

    fn rebuild_new(ops: &[DiffOp]) -> Vec<&str> {
        ops.iter()
            .filter(|op| !matches!(op, DiffOp::Removed(_)))
            .map(DiffOp::line)
            .collect()
    }

    #[test]
    fn single_line_replacement() {
        let ops = compute_diff("A\nB\nC", "A\nX\nC");
        assert_eq!(
            ops,
            vec![
                DiffOp::Unchanged("A".into()),
                DiffOp::Removed("B".into()),
                DiffOp::Added("X".into()),
                DiffOp::Unchanged("C".into()),
            ]
        );
    }

    #[test]
    fn empty_inputs() {
        assert!(compute_diff("", "").is_empty());
        assert_eq!(
            compute_diff("", "a\nb"),
            vec![DiffOp::Added("a".into()), DiffOp::Added("b".into())]
        );
        assert_eq!(compute_diff("a", ""), vec![DiffOp::Removed("a".into())]);
    }

    #[test]
    fn script_is_minimal() {
        // LCS of these is "a c e" (3), so 2 removals and 2 additions.
        let ops = compute_diff("a\nb\nc\nd\ne", "a\nc\nx\ne\ny");
        let changes = ops.iter().filter(|op| op.is_change()).count();
        assert_eq!(changes, 4);
        assert_eq!(rebuild_new(&ops), vec!["a", "c", "x", "e", "y"]);
    }

    #[test]
    fn ties_prefer_removal_first() {
        assert_eq!(
            compute_diff("a", "b"),
            vec![DiffOp::Removed("a".into()), DiffOp::Added("b".into())]
        );
    }

    #[test]
    fn repeated_lines_match_earliest_old_line() {
        let ops = compute_diff("x\nx", "x");
        assert_eq!(
            ops,
            vec![DiffOp::Unchanged("x".into()), DiffOp::Removed("x".into())]
        );
    }

    #[test]
    fn change_set_collects_lines() {
        let changes = ChangeSet::between("keep\nold one\nold two", "keep\nnew");
        assert_eq!(changes.removed, vec!["old one", "old two"]);
        assert_eq!(changes.added, vec!["new"]);
        assert!(ChangeSet::between("same", "same").is_empty());
    }

    #[test]
    fn bulk_rewrite_stays_within_linear_memory() {
        let old: Vec<String> = (0..3000).map(|i| format!("old {i}")).collect();
        let mut new: Vec<String> = (0..3000).map(|i| format!("new {i}")).collect();
        new[1500] = "old 1500".to_string();
        let (old, new) = (old.join("\n"), new.join("\n"));

        let ops = compute_diff(&old, &new);
        assert_eq!(ops.iter().filter(|op| !op.is_change()).count(), 1);
        assert_eq!(ops.len(), 5999);
        assert_eq!(rebuild_old(&ops), split_lines(&old));
        assert_eq!(rebuild_new(&ops), split_lines(&new));
    }

    #[test]
    fn split_path_keeps_removal_first_on_single_change() {
        let (old, new) = ("A\nB\nC\nE\nD", "A\nX\nC\nY\nD");
        let ops = compute_diff_bounded(old, new, 1);
        assert_eq!(
            ops,
            vec![
                DiffOp::Unchanged("A".into()),
                DiffOp::Removed("B".into()),
                DiffOp::Added("X".into()),
                DiffOp::Unchanged("C".into()),
                DiffOp::Removed("E".into()),
                DiffOp::Added("Y".into()),
                DiffOp::Unchanged("D".into()),
            ]
        );
        assert_eq!(ops, compute_diff(old, new));
    }

    proptest! {
        #[test]
        fn identical_text_has_no_changes(lines in prop::collection::vec("[a-c]{0,2}", 0..12)) {
            let text = lines.join("\n");
            let ops = compute_diff(&text, &text);
            prop_assert!(ops.iter().all(|op| !op.is_change()));
        }

        #[test]
        fn script_reconstructs_both_sides(
            old in prop::collection::vec("[a-d]{0,2}", 0..12),
            new in prop::collection::vec("[a-d]{0,2}", 0..12),
        ) {
            let (old, new) = (old.join("\n"), new.join("\n"));
            let ops = compute_diff(&old, &new);
            prop_assert_eq!(rebuild_old(&ops), split_lines(&old));
            prop_assert_eq!(rebuild_new(&ops), split_lines(&new));
        }

        #[test]
        fn split_path_is_as_short_as_the_table(
            old in prop::collection::vec("[a-d]{0,1}", 0..16),
            new in prop::collection::vec("[a-d]{0,1}", 0..16),
        ) {
            let (old, new) = (old.join("\n"), new.join("\n"));
            let table = compute_diff(&old, &new);
            let split = compute_diff_bounded(&old, &new, 4);
            prop_assert_eq!(rebuild_old(&split), split_lines(&old));
            prop_assert_eq!(rebuild_new(&split), split_lines(&new));
            prop_assert_eq!(
                split.iter().filter(|op| op.is_change()).count(),
                table.iter().filter(|op| op.is_change()).count()
            );
        }

        #[test]
        fn output_is_deterministic(
            old in prop::collection::vec("[a-c]{0,1}", 0..10),
            new in prop::collection::vec("[a-c]{0,1}", 0..10),
        ) {
            let (old, new) = (old.join("\n"), new.join("\n"));
            prop_assert_eq!(compute_diff(&old, &new), compute_diff(&old, &new));
        }
    }
}
