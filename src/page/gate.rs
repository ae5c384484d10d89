use super::model::Block;

/// Outcome of an unlock attempt against a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unlock {
    /// Secret matched (or the block has no password) — caller may perform
    /// the block's normal activation exactly once.
    Granted { url: Option<String> },
    /// Secret did not match. The stored password is never part of this
    /// variant, so it cannot leak into a response.
    Denied,
}

/// Check an activation attempt against a block's password gate.
///
/// Exact plaintext string comparison, by design of the document format:
/// no hashing and no rate limiting, so this is casual deterrence only,
/// not security. Blocks without a password (or with an empty one) pass
/// straight through.
pub fn try_unlock(block: &Block, attempt: &str) -> Unlock {
    if !block.is_locked() {
        return Unlock::Granted {
            url: block.url.clone(),
        };
    }

    match &block.password {
        Some(stored) if stored == attempt => Unlock::Granted {
            url: block.url.clone(),
        },
        _ => Unlock::Denied,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::model::BlockKind;

    fn gated(password: &str, url: &str) -> Block {
        let mut b = Block::new("g".into(), BlockKind::Standard, 0);
        b.password = Some(password.to_string());
        b.url = Some(url.to_string());
        b
    }

    #[test]
    fn exact_match_grants_the_activation_target() {
        let block = gated("open sesame", "https://example.com/secret");
        assert_eq!(
            try_unlock(&block, "open sesame"),
            Unlock::Granted {
                url: Some("https://example.com/secret".into())
            }
        );
    }

    #[test]
    fn any_non_matching_secret_is_denied() {
        let block = gated("open sesame", "https://example.com/secret");
        for attempt in ["open Sesame", "open sesame ", "sesame", "password", ""] {
            assert_eq!(try_unlock(&block, attempt), Unlock::Denied, "attempt {:?}", attempt);
        }
    }

    #[test]
    fn denied_outcome_carries_nothing() {
        // The Denied variant has no payload; verify the URL is not reachable
        // through it either.
        let block = gated("pw", "https://example.com");
        match try_unlock(&block, "wrong") {
            Unlock::Denied => {}
            Unlock::Granted { .. } => panic!("wrong password must not unlock"),
        }
    }

    #[test]
    fn ungated_block_activates_directly() {
        let mut block = Block::new("u".into(), BlockKind::Standard, 0);
        block.url = Some("https://example.com".into());
        assert_eq!(
            try_unlock(&block, ""),
            Unlock::Granted {
                url: Some("https://example.com".into())
            }
        );
    }

    #[test]
    fn empty_stored_password_counts_as_ungated() {
        let block = gated("", "https://example.com");
        assert!(matches!(try_unlock(&block, "anything"), Unlock::Granted { .. }));
    }
}
