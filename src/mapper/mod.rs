//! Bidirectional mapping between the configuration tree and the wire shapes.
//!
//! - [`expand`]: tree to create payloads (no identities)
//! - [`update`]: observed/desired pair to update deltas (identities copied from observed)
//! - [`flatten`]: remote descriptions to a fully populated tree
//!
//! Mapping is pure: no I/O, no logging. Mutually exclusive members are
//! decided by presence; a tree carrying more than one is rejected with a
//! [`ContractViolation`](crate::error::ContractViolation).

pub mod expand;
pub mod flatten;
pub mod update;

use crate::error::ContractViolation;

/// Rejects more than one present member of a oneof group.
pub(crate) fn ensure_oneof(area: &str, members: &[(&str, bool)]) -> Result<(), ContractViolation> {
    let present: Vec<&str> = members
        .iter()
        .filter(|(_, is_set)| *is_set)
        .map(|(name, _)| *name)
        .collect();

    if present.len() > 1 {
        return Err(ContractViolation::new(
            area,
            format!("only one of [{}] may be set", present.join(", ")),
        ));
    }
    Ok(())
}

/// Returns the identity of an observed sub-object or a contract violation.
pub(crate) fn require_identity<'a>(
    area: &str,
    identity: Option<&'a str>,
) -> Result<&'a str, ContractViolation> {
    identity
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ContractViolation::new(area, "observed object has no server-assigned identity"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oneof_accepts_single_member() {
        assert!(ensure_oneof("code", &[("text", true), ("s3", false)]).is_ok());
        assert!(ensure_oneof("code", &[("text", false), ("s3", false)]).is_ok());
    }

    #[test]
    fn test_oneof_rejects_two_members() {
        let err = ensure_oneof("code", &[("text", true), ("s3", true)]).unwrap_err();
        assert_eq!(err.area, "code");
        assert!(err.message.contains("text, s3"));
    }

    #[test]
    fn test_require_identity_rejects_empty() {
        assert!(require_identity("outputs", Some("")).is_err());
        assert_eq!(require_identity("outputs", Some("1.1")).ok(), Some("1.1"));
    }
}
