//! engine::testing
//!
//! In-memory repository implementing the backend traits, for unit tests of
//! the engine. Trees are flat `path -> content` maps; applying a commit is a
//! per-file three-way merge against the commit's first parent.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

use crate::core::types::{BranchName, Commit, Oid, Reference};
use crate::git::{
    ApplyOutcome, ApplyStrategy, GitError, GitState, HeadState, MergeAnalysis, MergeBackend,
    TrackingRef, VcsBackend, WorktreeStatus,
};

type Tree = BTreeMap<String, String>;

#[derive(Debug, Clone)]
enum Head {
    Attached(String),
    Detached(Oid),
}

#[derive(Debug)]
struct Stored {
    commit: Commit,
    tree: Tree,
}

/// Index and working tree contents that differ from HEAD.
#[derive(Debug, Clone)]
struct Work {
    tree: Tree,
    conflicts: BTreeSet<String>,
}

#[derive(Debug)]
struct State {
    commits: Vec<Stored>,
    by_id: HashMap<Oid, usize>,
    branches: BTreeMap<String, Oid>,
    head: Head,
    work: Option<Work>,
    untracked: BTreeSet<String>,
    git_state: GitState,
    tracking: HashMap<String, TrackingRef>,
    merge_head: Option<(Oid, String)>,
    fetched: Vec<String>,
    next_id: u64,
}

#[derive(Debug)]
pub(crate) struct FakeRepo {
    state: RefCell<State>,
}

fn three_way(base: &Tree, ours: &Tree, theirs: &Tree, favor_theirs: bool) -> Work {
    let paths: BTreeSet<&String> = base.keys().chain(ours.keys()).chain(theirs.keys()).collect();
    let mut tree = Tree::new();
    let mut conflicts = BTreeSet::new();
    for path in paths {
        let (b, o, t) = (base.get(path), ours.get(path), theirs.get(path));
        let merged = if t == b || o == t {
            o
        } else if o == b {
            t
        } else {
            if !favor_theirs {
                conflicts.insert(path.clone());
            }
            t
        };
        if let Some(content) = merged {
            tree.insert(path.clone(), content.clone());
        }
    }
    Work { tree, conflicts }
}

impl State {
    fn stored(&self, id: &Oid) -> Result<&Stored, GitError> {
        self.by_id
            .get(id)
            .map(|&i| &self.commits[i])
            .ok_or_else(|| GitError::ObjectNotFound { oid: id.to_string() })
    }

    fn head_oid(&self) -> Oid {
        match &self.head {
            Head::Attached(name) => self.branches[name].clone(),
            Head::Detached(oid) => oid.clone(),
        }
    }

    fn head_tree(&self) -> Tree {
        self.commits[self.by_id[&self.head_oid()]].tree.clone()
    }

    fn move_head(&mut self, to: Oid) {
        if let Head::Attached(name) = &self.head {
            self.branches.insert(name.clone(), to);
        } else {
            self.head = Head::Detached(to);
        }
    }

    fn add_commit(&mut self, parents: Vec<Oid>, message: &str, tree: Tree) -> Oid {
        self.next_id += 1;
        let id = Oid::new(format!("{:040x}", self.next_id)).unwrap();
        let commit = Commit {
            id: id.clone(),
            parent_ids: parents,
            short_message: message.lines().next().unwrap_or("").to_string(),
            full_message: message.to_string(),
        };
        self.by_id.insert(id.clone(), self.commits.len());
        self.commits.push(Stored { commit, tree });
        id
    }

    /// `id` and everything reachable from it.
    fn ancestors(&self, id: &Oid) -> BTreeSet<Oid> {
        let mut seen = BTreeSet::new();
        let mut queue = VecDeque::from([id.clone()]);
        while let Some(next) = queue.pop_front() {
            if !seen.insert(next.clone()) {
                continue;
            }
            if let Ok(stored) = self.stored(&next) {
                queue.extend(stored.commit.parent_ids.iter().cloned());
            }
        }
        seen
    }
}

impl FakeRepo {
    /// One commit ("Initial commit", README.md) on `main`, checked out.
    pub fn new() -> Self {
        let mut state = State {
            commits: Vec::new(),
            by_id: HashMap::new(),
            branches: BTreeMap::new(),
            head: Head::Attached("main".to_string()),
            work: None,
            untracked: BTreeSet::new(),
            git_state: GitState::Clean,
            tracking: HashMap::new(),
            merge_head: None,
            fetched: Vec::new(),
            next_id: 0,
        };
        let tree = Tree::from([("README.md".to_string(), "# Test\n".to_string())]);
        let root = state.add_commit(vec![], "Initial commit\n", tree);
        state.branches.insert("main".to_string(), root);
        Self {
            state: RefCell::new(state),
        }
    }

    pub fn head_oid(&self) -> Oid {
        self.state.borrow().head_oid()
    }

    /// Commit `files` on top of HEAD and advance it.
    pub fn commit_on_head(&self, message: &str, files: &[(&str, &str)]) -> Oid {
        let mut state = self.state.borrow_mut();
        let mut tree = state.head_tree();
        for (path, content) in files {
            tree.insert(path.to_string(), content.to_string());
        }
        let parent = state.head_oid();
        let id = state.add_commit(vec![parent], &format!("{message}\n"), tree);
        state.move_head(id.clone());
        id
    }

    /// Record a merge of `other` into HEAD, taking `other`'s files.
    pub fn merge_commit_on_head(&self, message: &str, other: &Oid) -> Oid {
        let mut state = self.state.borrow_mut();
        let mut tree = state.head_tree();
        let other_tree = state.stored(other).unwrap().tree.clone();
        tree.extend(other_tree);
        let parent = state.head_oid();
        let id = state.add_commit(vec![parent, other.clone()], &format!("{message}\n"), tree);
        state.move_head(id.clone());
        id
    }

    pub fn create_branch(&self, name: &str, at: &Oid) {
        self.state
            .borrow_mut()
            .branches
            .insert(name.to_string(), at.clone());
    }

    pub fn switch(&self, name: &str) {
        let mut state = self.state.borrow_mut();
        assert!(state.branches.contains_key(name), "no branch {name}");
        state.head = Head::Attached(name.to_string());
    }

    pub fn detach(&self) {
        let mut state = self.state.borrow_mut();
        let oid = state.head_oid();
        state.head = Head::Detached(oid);
    }

    pub fn commit(&self, id: &Oid) -> Commit {
        self.state.borrow().stored(id).unwrap().commit.clone()
    }

    pub fn branch_tip(&self, name: &str) -> Oid {
        self.state.borrow().branches[name].clone()
    }

    pub fn head_is_detached(&self) -> bool {
        matches!(self.state.borrow().head, Head::Detached(_))
    }

    /// Files at HEAD, or in the working tree when there is work in progress.
    pub fn file(&self, path: &str) -> Option<String> {
        let state = self.state.borrow();
        match &state.work {
            Some(work) => work.tree.get(path).cloned(),
            None => state.head_tree().get(path).cloned(),
        }
    }

    /// Messages of the first-parent history of HEAD, newest first.
    pub fn log(&self) -> Vec<String> {
        let state = self.state.borrow();
        let mut messages = Vec::new();
        let mut next = Some(state.head_oid());
        while let Some(id) = next {
            let stored = state.stored(&id).unwrap();
            messages.push(stored.commit.short_message.clone());
            next = stored.commit.parent_ids.first().cloned();
        }
        messages
    }

    pub fn add_untracked(&self, path: &str) {
        self.state.borrow_mut().untracked.insert(path.to_string());
    }

    pub fn set_git_state(&self, state: GitState) {
        self.state.borrow_mut().git_state = state;
    }

    pub fn set_tracking(&self, branch: &str, tracking: TrackingRef) {
        self.state
            .borrow_mut()
            .tracking
            .insert(branch.to_string(), tracking);
    }

    pub fn fetched(&self) -> Vec<String> {
        self.state.borrow().fetched.clone()
    }

    /// Resolve a conflicted path as if the user edited it and ran `git add`.
    pub fn resolve(&self, path: &str, content: &str) {
        let mut state = self.state.borrow_mut();
        let work = state.work.as_mut().expect("no work in progress");
        work.conflicts.remove(path);
        work.tree.insert(path.to_string(), content.to_string());
    }
}

impl VcsBackend for FakeRepo {
    fn head(&self) -> Result<HeadState, GitError> {
        let state = self.state.borrow();
        Ok(match &state.head {
            Head::Attached(name) => HeadState::Branch {
                name: BranchName::new(name.as_str())?,
                target: state.branches[name].clone(),
            },
            Head::Detached(oid) => HeadState::Detached(oid.clone()),
        })
    }

    fn resolve_reference(&self, spec: &str) -> Result<Reference, GitError> {
        let state = self.state.borrow();
        if let Some(tip) = state.branches.get(spec) {
            return Ok(Reference::new(spec, tip.clone()));
        }
        match Oid::new(spec) {
            Ok(oid) if state.by_id.contains_key(&oid) => Ok(Reference::new(spec, oid)),
            _ => Err(GitError::RefNotFound {
                refname: spec.to_string(),
            }),
        }
    }

    fn find_commit(&self, id: &Oid) -> Result<Commit, GitError> {
        Ok(self.state.borrow().stored(id)?.commit.clone())
    }

    fn list_commits_between(&self, base: &Oid, tip: &Oid) -> Result<Vec<Commit>, GitError> {
        let state = self.state.borrow();
        let hidden = state.ancestors(base);
        let mut seqs: Vec<usize> = state
            .ancestors(tip)
            .difference(&hidden)
            .map(|id| state.by_id[id])
            .collect();
        seqs.sort_unstable();
        Ok(seqs
            .into_iter()
            .map(|i| state.commits[i].commit.clone())
            .collect())
    }

    fn is_ancestor(&self, ancestor: &Oid, descendant: &Oid) -> Result<bool, GitError> {
        Ok(self.state.borrow().ancestors(descendant).contains(ancestor))
    }

    fn apply_commit(
        &self,
        commit: &Commit,
        strategy: ApplyStrategy,
    ) -> Result<ApplyOutcome, GitError> {
        let mut state = self.state.borrow_mut();
        let theirs = state.stored(&commit.id)?.tree.clone();
        let base = match commit.parent_ids.first() {
            Some(parent) => state.stored(parent)?.tree.clone(),
            None => Tree::new(),
        };
        let ours = state.head_tree();
        let work = three_way(&base, &ours, &theirs, strategy == ApplyStrategy::FavorReplayed);
        let paths: Vec<String> = work.conflicts.iter().cloned().collect();
        state.work = Some(work);
        if paths.is_empty() {
            Ok(ApplyOutcome::Clean)
        } else {
            Ok(ApplyOutcome::Conflicted { paths })
        }
    }

    fn commit_index_as(&self, original: &Commit) -> Result<Option<Commit>, GitError> {
        let mut state = self.state.borrow_mut();
        let head_tree = state.head_tree();
        let work = state.work.take().unwrap_or(Work {
            tree: head_tree.clone(),
            conflicts: BTreeSet::new(),
        });
        if !work.conflicts.is_empty() {
            state.work = Some(work);
            return Err(GitError::Internal {
                message: "index has conflicts".to_string(),
            });
        }
        if work.tree == head_tree {
            return Ok(None);
        }
        let parent = state.head_oid();
        let id = state.add_commit(vec![parent], &original.full_message, work.tree);
        state.move_head(id.clone());
        Ok(Some(state.stored(&id)?.commit.clone()))
    }

    fn checkout_detached(&self, target: &Oid) -> Result<(), GitError> {
        let mut state = self.state.borrow_mut();
        state.stored(target)?;
        state.head = Head::Detached(target.clone());
        state.work = None;
        Ok(())
    }

    fn checkout_branch(&self, branch: &BranchName) -> Result<(), GitError> {
        let mut state = self.state.borrow_mut();
        if !state.branches.contains_key(branch.as_str()) {
            return Err(GitError::RefNotFound {
                refname: branch.refname(),
            });
        }
        state.head = Head::Attached(branch.to_string());
        Ok(())
    }

    fn update_branch(&self, branch: &BranchName, target: &Oid) -> Result<(), GitError> {
        self.state
            .borrow_mut()
            .branches
            .insert(branch.to_string(), target.clone());
        Ok(())
    }

    fn reset_hard(&self, target: &Oid) -> Result<(), GitError> {
        let mut state = self.state.borrow_mut();
        state.stored(target)?;
        state.move_head(target.clone());
        state.work = None;
        state.merge_head = None;
        state.git_state = GitState::Clean;
        Ok(())
    }

    fn current_status(&self) -> Result<WorktreeStatus, GitError> {
        let state = self.state.borrow();
        let mut status = WorktreeStatus {
            untracked: state.untracked.clone(),
            ..Default::default()
        };
        if let Some(work) = &state.work {
            let head_tree = state.head_tree();
            status.conflicted = work.conflicts.clone();
            for path in head_tree.keys().chain(work.tree.keys()) {
                if !work.conflicts.contains(path) && head_tree.get(path) != work.tree.get(path) {
                    status.changed.insert(path.clone());
                }
            }
        }
        Ok(status)
    }

    fn resolve_tracking_ref(&self, branch: &BranchName) -> Result<Option<TrackingRef>, GitError> {
        Ok(self.state.borrow().tracking.get(branch.as_str()).cloned())
    }

    fn in_progress_state(&self) -> GitState {
        self.state.borrow().git_state
    }
}

impl MergeBackend for FakeRepo {
    fn merge_analysis(&self, theirs: &Oid) -> Result<MergeAnalysis, GitError> {
        let head = self.head_oid();
        if self.is_ancestor(theirs, &head)? {
            Ok(MergeAnalysis::UpToDate)
        } else if self.is_ancestor(&head, theirs)? {
            Ok(MergeAnalysis::FastForward)
        } else {
            Ok(MergeAnalysis::Normal)
        }
    }

    fn merge_into_index(&self, theirs: &Oid, message: &str) -> Result<ApplyOutcome, GitError> {
        let mut state = self.state.borrow_mut();
        let head = state.head_oid();
        let common = state.ancestors(&head);
        let base_id = state
            .ancestors(theirs)
            .intersection(&common)
            .max_by_key(|id| state.by_id[*id])
            .cloned();
        let base = match base_id {
            Some(id) => state.stored(&id)?.tree.clone(),
            None => Tree::new(),
        };
        let their_tree = state.stored(theirs)?.tree.clone();
        let work = three_way(&base, &state.head_tree(), &their_tree, false);
        let paths: Vec<String> = work.conflicts.iter().cloned().collect();
        state.work = Some(work);
        state.merge_head = Some((theirs.clone(), message.to_string()));
        state.git_state = GitState::Merge;
        if paths.is_empty() {
            Ok(ApplyOutcome::Clean)
        } else {
            Ok(ApplyOutcome::Conflicted { paths })
        }
    }

    fn commit_merge(&self) -> Result<Commit, GitError> {
        let mut state = self.state.borrow_mut();
        let (theirs, message) = state.merge_head.take().ok_or(GitError::RefNotFound {
            refname: "MERGE_HEAD".to_string(),
        })?;
        let work = state.work.take().unwrap_or(Work {
            tree: state.head_tree(),
            conflicts: BTreeSet::new(),
        });
        if !work.conflicts.is_empty() {
            return Err(GitError::Internal {
                message: "index has conflicts".to_string(),
            });
        }
        let parent = state.head_oid();
        let id = state.add_commit(vec![parent, theirs], &format!("{message}\n"), work.tree);
        state.move_head(id.clone());
        state.git_state = GitState::Clean;
        Ok(state.stored(&id)?.commit.clone())
    }

    fn fetch(&self, remote: &str) -> Result<(), GitError> {
        self.state.borrow_mut().fetched.push(remote.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_way_merges_per_file() {
        let base = Tree::from([("a".into(), "1".into()), ("b".into(), "1".into())]);
        let ours = Tree::from([("a".into(), "2".into()), ("b".into(), "1".into())]);
        let theirs = Tree::from([
            ("a".into(), "3".into()),
            ("b".into(), "1".into()),
            ("c".into(), "new".into()),
        ]);

        let work = three_way(&base, &ours, &theirs, false);
        assert_eq!(work.conflicts, BTreeSet::from(["a".to_string()]));
        assert_eq!(work.tree.get("c").map(String::as_str), Some("new"));

        let favored = three_way(&base, &ours, &theirs, true);
        assert!(favored.conflicts.is_empty());
        assert_eq!(favored.tree.get("a").map(String::as_str), Some("3"));
    }
}
