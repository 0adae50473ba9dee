//! engine::upstream
//!
//! Chooses the baseline a rebase or pull replays onto.
//!
//! An explicit upstream always wins. Otherwise the current branch's
//! configured tracking reference (`branch.<name>.remote` and
//! `branch.<name>.merge`) is used. There is no fallback guess: a detached
//! HEAD or a branch without tracking configuration is an error.

use crate::core::types::{BranchName, Reference};
use crate::git::{TrackingRef, VcsBackend};

use super::error::ReplayError;
use super::gate::PreconditionError;

pub struct UpstreamResolver<'a, B: VcsBackend> {
    backend: &'a B,
}

impl<'a, B: VcsBackend> UpstreamResolver<'a, B> {
    pub fn new(backend: &'a B) -> Self {
        Self { backend }
    }

    /// The explicit upstream unchanged, else the tracking reference.
    pub fn resolve(&self, explicit: Option<Reference>) -> Result<Reference, ReplayError> {
        if let Some(reference) = explicit {
            return Ok(reference);
        }
        let (_, tracking) = self.tracking()?;
        let target = self.backend.resolve_reference(&tracking.refname)?.target;
        tracing::debug!(upstream = %tracking.name, target = %target.abbrev(), "resolved tracking upstream");
        Ok(Reference::new(tracking.name, target))
    }

    /// The current branch and its tracking configuration.
    pub fn tracking(&self) -> Result<(BranchName, TrackingRef), ReplayError> {
        let head = self.backend.head()?;
        let Some(branch) = head.branch() else {
            return Err(PreconditionError::NoTrackingInfo { branch: None }.into());
        };
        match self.backend.resolve_tracking_ref(branch)? {
            Some(tracking) => Ok((branch.clone(), tracking)),
            None => Err(PreconditionError::NoTrackingInfo {
                branch: Some(branch.clone()),
            }
            .into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::FakeRepo;

    fn no_tracking(err: ReplayError) -> Option<BranchName> {
        match err {
            ReplayError::Precondition(PreconditionError::NoTrackingInfo { branch }) => branch,
            other => panic!("expected NoTrackingInfo, got {other:?}"),
        }
    }

    #[test]
    fn explicit_is_returned_unchanged() {
        let repo = FakeRepo::new();
        let explicit = Reference::new("anything", repo.head_oid());
        let resolved = UpstreamResolver::new(&repo)
            .resolve(Some(explicit.clone()))
            .unwrap();
        assert_eq!(resolved, explicit);
    }

    #[test]
    fn tracking_reference_is_used() {
        let repo = FakeRepo::new();
        let base = repo.head_oid();
        repo.create_branch("upstream", &base);
        repo.commit_on_head("C1", &[("a.txt", "1")]);
        repo.set_tracking(
            "main",
            TrackingRef {
                remote: ".".into(),
                refname: "upstream".into(),
                name: "upstream".into(),
            },
        );

        let resolved = UpstreamResolver::new(&repo).resolve(None).unwrap();
        assert_eq!(resolved, Reference::new("upstream", base));
    }

    #[test]
    fn missing_configuration_never_guesses() {
        let repo = FakeRepo::new();
        repo.create_branch("origin/main", &repo.head_oid());
        let err = UpstreamResolver::new(&repo).resolve(None).unwrap_err();
        assert_eq!(no_tracking(err), Some(BranchName::new("main").unwrap()));
    }

    #[test]
    fn detached_head_has_no_tracking() {
        let repo = FakeRepo::new();
        repo.detach();
        let err = UpstreamResolver::new(&repo).resolve(None).unwrap_err();
        assert_eq!(no_tracking(err), None);
    }
}
