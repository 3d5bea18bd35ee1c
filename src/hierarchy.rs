//! Hierarchy Builder (spec §4.2): fills `Depth`/`AncestorIds` on a flat,
//! order-preserving chunk sequence and flags cycles/orphans.

use crate::error::ChunkingError;
use crate::id::ChunkId;
use crate::model::Chunk;
use std::collections::HashMap;

/// A structural issue the Hierarchy Builder found while resolving parents.
/// Carried forward into [`crate::result::ChunkingWarning`]s rather than
/// failing the run.
#[derive(Debug, Clone)]
pub struct HierarchyIssue {
    pub code: &'static str,
    pub message: String,
    pub chunk_id: ChunkId,
}

/// The result of running the Hierarchy Builder over a flat chunk list: the
/// same chunks with `depth`/`ancestor_ids` filled in, plus any issues found.
pub struct HierarchyReport {
    pub chunks: Vec<Chunk>,
    pub issues: Vec<HierarchyIssue>,
}

/// Fill `depth` and `ancestor_ids` on every chunk in `chunks` (spec §4.2
/// algorithm). `chunks` must already be in document/sequence order;
/// `parent_id` must be set where applicable but `depth`/`ancestor_ids` are
/// ignored on input and overwritten.
///
/// Fails with [`ChunkingError::DuplicateId`] if two chunks share an `Id`
/// (spec step 1); that is the one condition this component cannot safely
/// paper over, since every other step depends on the id index being
/// injective.
pub fn build_hierarchy(mut chunks: Vec<Chunk>) -> Result<HierarchyReport, ChunkingError> {
    let mut index: HashMap<ChunkId, usize> = HashMap::with_capacity(chunks.len());
    for (i, chunk) in chunks.iter().enumerate() {
        if index.insert(chunk.id(), i).is_some() {
            return Err(ChunkingError::DuplicateId(chunk.id().to_string()));
        }
    }

    let mut issues = Vec::new();
    // Memoized (depth, ancestor_ids) per resolved chunk index, computed once
    // per node no matter how many descendants re-walk through it (spec "O(N)
    // amortized via memoization").
    let mut resolved: Vec<Option<(usize, Vec<ChunkId>)>> = vec![None; chunks.len()];

    for i in 0..chunks.len() {
        if resolved[i].is_some() {
            continue;
        }
        resolve_chunk(i, &chunks, &index, &mut resolved, &mut issues);
    }

    for (i, chunk) in chunks.iter_mut().enumerate() {
        if let Some((depth, ancestors)) = resolved[i].take() {
            chunk.header.depth = depth;
            chunk.header.ancestor_ids = ancestors;
        }
    }

    Ok(HierarchyReport { chunks, issues })
}

fn resolve_chunk(
    start: usize,
    chunks: &[Chunk],
    index: &HashMap<ChunkId, usize>,
    resolved: &mut Vec<Option<(usize, Vec<ChunkId>)>>,
    issues: &mut Vec<HierarchyIssue>,
) {
    // Walk parent_id upward from `start`, collecting the path; stop early if
    // we reach a node already resolved so its memoized ancestors can be
    // reused directly.
    let mut path = Vec::new();
    let mut seen_on_walk = std::collections::HashSet::new();
    let mut current = start;

    loop {
        if let Some((depth, ancestors)) = resolved[current].clone() {
            // `current` was memoized by an earlier top-level iteration;
            // everything walked so far in `path` hangs off its known
            // depth/ancestors.
            finalize_path(&path, chunks, resolved, &ancestors, depth);
            return;
        }

        if !seen_on_walk.insert(current) {
            // Cycle: spec step 3 — promote the chunk we started the walk
            // from to root rather than the one where the cycle closed, since
            // that is the chunk we're actually resolving right now.
            issues.push(HierarchyIssue {
                code: "CIRCULAR_REFERENCE",
                message: format!(
                    "cycle detected while resolving ancestors of chunk {}",
                    chunks[start].id()
                ),
                chunk_id: chunks[start].id(),
            });
            resolved[start] = Some((0, Vec::new()));
            return;
        }
        path.push(current);

        let parent_id = match chunks[current].parent_id() {
            Some(id) => id,
            None => {
                // Root: depth 0, no ancestors.
                finalize_path(&path, chunks, resolved, &[], 0);
                return;
            }
        };

        match index.get(&parent_id) {
            Some(&parent_idx) => current = parent_idx,
            None => {
                issues.push(HierarchyIssue {
                    code: "ORPHANED_CHUNK",
                    message: format!(
                        "chunk {} references missing parent {}",
                        chunks[current].id(),
                        parent_id
                    ),
                    chunk_id: chunks[current].id(),
                });
                // Dangling parent: spec step 4 — leave ParentId untouched,
                // Depth = 0 for the orphan itself. Chunks below it in the
                // walk (closer to `start`) are one level deeper each.
                finalize_path(&path, chunks, resolved, &[], 0);
                return;
            }
        }
    }
}

/// Assign depth/ancestors along a walked path, given the root's own
/// `(ancestors, depth)` (empty/0 for an actual root or orphan).
fn finalize_path(
    path: &[usize],
    chunks: &[Chunk],
    resolved: &mut Vec<Option<(usize, Vec<ChunkId>)>>,
    root_ancestors: &[ChunkId],
    root_depth: usize,
) {
    let mut ancestors = root_ancestors.to_vec();
    let mut depth = root_depth;
    // path[last] is the root/orphan/cycle-closure end; path[0] is `start`.
    for &idx in path.iter().rev() {
        resolved[idx] = Some((depth, ancestors.clone()));
        ancestors.push(chunks[idx].id());
        depth += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Chunk, ChunkBody, ChunkHeader, ChunkMetadata, DocumentType, SectionChunk};

    fn section(id: ChunkId, seq: u64, parent: Option<ChunkId>) -> Chunk {
        let metadata = ChunkMetadata::new(DocumentType::Markdown, "root");
        let mut header = ChunkHeader::new(id, seq, "Heading1", metadata);
        if let Some(p) = parent {
            header = header.with_parent(p);
        }
        Chunk::new(
            header,
            ChunkBody::Section(SectionChunk {
                heading_level: Some(1),
                heading_text: "H".into(),
                ..Default::default()
            }),
        )
    }

    #[test]
    fn root_has_zero_depth_and_no_ancestors() {
        let id = ChunkId::new_random();
        let chunks = vec![section(id, 0, None)];
        let report = build_hierarchy(chunks).unwrap();
        assert_eq!(report.chunks[0].header.depth, 0);
        assert!(report.chunks[0].header.ancestor_ids.is_empty());
        assert!(report.issues.is_empty());
    }

    #[test]
    fn child_depth_is_parent_depth_plus_one() {
        let root_id = ChunkId::new_random();
        let child_id = ChunkId::new_random();
        let chunks = vec![section(root_id, 0, None), section(child_id, 1, Some(root_id))];
        let report = build_hierarchy(chunks).unwrap();
        assert_eq!(report.chunks[1].header.depth, 1);
        assert_eq!(report.chunks[1].header.ancestor_ids, vec![root_id]);
    }

    #[test]
    fn three_generation_chain_accumulates_ancestors() {
        let a = ChunkId::new_random();
        let b = ChunkId::new_random();
        let c = ChunkId::new_random();
        let chunks = vec![
            section(a, 0, None),
            section(b, 1, Some(a)),
            section(c, 2, Some(b)),
        ];
        let report = build_hierarchy(chunks).unwrap();
        assert_eq!(report.chunks[2].header.depth, 2);
        assert_eq!(report.chunks[2].header.ancestor_ids, vec![a, b]);
    }

    #[test]
    fn dangling_parent_is_reported_as_orphan() {
        let missing = ChunkId::new_random();
        let chunk_id = ChunkId::new_random();
        let chunks = vec![section(chunk_id, 0, Some(missing))];
        let report = build_hierarchy(chunks).unwrap();
        assert_eq!(report.chunks[0].header.depth, 0);
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].code, "ORPHANED_CHUNK");
    }

    #[test]
    fn cycle_is_broken_by_promoting_to_root() {
        let a = ChunkId::new_random();
        let b = ChunkId::new_random();
        let mut chunks = vec![section(a, 0, Some(b)), section(b, 1, Some(a))];
        chunks[0].header.parent_id = Some(b);
        chunks[1].header.parent_id = Some(a);
        let report = build_hierarchy(chunks).unwrap();
        assert!(report.issues.iter().any(|i| i.code == "CIRCULAR_REFERENCE"));
    }

    #[test]
    fn duplicate_ids_fail_fast() {
        let id = ChunkId::new_random();
        let chunks = vec![section(id, 0, None), section(id, 1, None)];
        let result = build_hierarchy(chunks);
        assert!(matches!(result, Err(ChunkingError::DuplicateId(_))));
    }
}
