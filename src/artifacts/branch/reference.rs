use crate::areas::database::Database;
use crate::areas::refs::Refs;
use crate::artifacts::branch::branch_name::BranchName;
use crate::artifacts::branch::{HEAD_REF_NAME, REF_ALIASES};
use crate::artifacts::core::error::HeroError;
use crate::artifacts::objects::digest::Digest;

/// A user-supplied reference token, classified once
///
/// Supported forms:
/// - `HEAD` or its alias `@`: the current position
/// - an existing branch name
/// - a full digest, or an unambiguous prefix (4+ hex characters) of a stored commit
///
/// Branch names win over digest prefixes, so a branch called `cafe` shadows
/// commits starting with `cafe`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
    CurrentPosition,
    Named(BranchName),
    Raw(Digest),
}

impl Reference {
    pub fn parse(token: &str, refs: &Refs, database: &Database) -> anyhow::Result<Self> {
        let token = token.trim();
        let token = REF_ALIASES.get(token).copied().unwrap_or(token);

        if token == HEAD_REF_NAME {
            return Ok(Reference::CurrentPosition);
        }

        if let Ok(name) = BranchName::try_parse(token)
            && refs.branch_exists(&name)?
        {
            return Ok(Reference::Named(name));
        }

        if let Ok(digest) = Digest::try_parse(token) {
            return Ok(Reference::Raw(digest));
        }

        if Digest::looks_like_digest(token) {
            let mut candidates = database.find_by_prefix(token)?;

            return match candidates.len() {
                0 => Err(HeroError::UnknownReference(token.to_string()).into()),
                1 => Ok(Reference::Raw(candidates.remove(0))),
                n => Err(HeroError::AmbiguousReference {
                    prefix: token.to_string(),
                    candidates: n,
                }
                .into()),
            };
        }

        Err(HeroError::UnknownReference(token.to_string()).into())
    }

    /// The commit digest this reference points at right now
    pub fn resolve(&self, refs: &Refs) -> anyhow::Result<Digest> {
        match self {
            Reference::CurrentPosition => refs.current_position(),
            Reference::Named(name) => refs.head_of(name),
            Reference::Raw(digest) => Ok(digest.clone()),
        }
    }
}

impl std::fmt::Display for Reference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Reference::CurrentPosition => write!(f, "{HEAD_REF_NAME}"),
            Reference::Named(name) => write!(f, "{name}"),
            Reference::Raw(digest) => write!(f, "{digest}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::TempDir;
    use pretty_assertions::assert_eq;

    struct Fixture {
        _dir: TempDir,
        refs: Refs,
        database: Database,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let refs = Refs::new(dir.path().to_path_buf().into_boxed_path());
        std::fs::create_dir_all(refs.branches_path()).unwrap();
        let database = Database::new(dir.path().join("commits").into_boxed_path());
        std::fs::create_dir_all(database.objects_path()).unwrap();

        Fixture {
            _dir: dir,
            refs,
            database,
        }
    }

    #[test]
    fn head_and_its_alias_name_the_current_position() {
        let fixture = fixture();

        for token in ["HEAD", "@"] {
            assert_eq!(
                Reference::parse(token, &fixture.refs, &fixture.database).unwrap(),
                Reference::CurrentPosition
            );
        }
    }

    #[test]
    fn existing_branches_win_over_digest_prefixes() {
        let fixture = fixture();
        let digest = fixture.database.put(b"blob").unwrap();
        let name = BranchName::try_parse("cafe").unwrap();
        fixture.refs.create_branch(&name, &digest).unwrap();

        assert_eq!(
            Reference::parse("cafe", &fixture.refs, &fixture.database).unwrap(),
            Reference::Named(name)
        );
    }

    #[test]
    fn abbreviated_digests_resolve_to_stored_commits() {
        let fixture = fixture();
        let digest = fixture.database.put(b"blob").unwrap();

        assert_eq!(
            Reference::parse(&digest.as_ref()[..8], &fixture.refs, &fixture.database).unwrap(),
            Reference::Raw(digest)
        );
    }

    #[test]
    fn unknown_tokens_are_reference_errors() {
        let fixture = fixture();

        let error = Reference::parse("nowhere", &fixture.refs, &fixture.database).unwrap_err();

        assert_eq!(
            error.downcast_ref::<HeroError>().map(HeroError::exit_code),
            Some(2)
        );
    }

    #[test]
    fn unreadable_branch_directory_is_an_environment_failure() {
        let fixture = fixture();
        std::fs::remove_dir_all(fixture.refs.branches_path()).unwrap();

        let error = Reference::parse("main", &fixture.refs, &fixture.database).unwrap_err();

        assert!(error.downcast_ref::<HeroError>().is_none());
    }
}
