// ── Security identifiers ──
//
// Binary layout ([MS-DTYP] 2.4.2.2):
//   revision (1) | sub-authority count (1) | authority (6, big-endian)
//   | sub-authorities (count x 4, little-endian)
// The relative id of a domain object is its final sub-authority.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::model::RelativeId;

const HEADER_LEN: usize = 8;
const MAX_SUB_AUTHORITIES: usize = 15;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SidError {
    #[error("SID is {len} bytes, shorter than its {expected}-byte layout")]
    Truncated { len: usize, expected: usize },

    #[error("SID declares {count} sub-authorities (maximum {MAX_SUB_AUTHORITIES})")]
    TooManySubAuthorities { count: usize },

    #[error("SID has no sub-authorities")]
    NoRelativeId,

    #[error("Malformed SID string '{input}'")]
    Malformed { input: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SecurityIdentifier {
    revision: u8,
    authority: u64,
    sub_authorities: Vec<u32>,
}

impl SecurityIdentifier {
    pub fn new(authority: u64, sub_authorities: Vec<u32>) -> Self {
        Self {
            revision: 1,
            authority,
            sub_authorities,
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SidError> {
        let (&revision, rest) = bytes.split_first().ok_or(SidError::Truncated {
            len: 0,
            expected: HEADER_LEN,
        })?;
        let count = usize::from(rest.first().copied().unwrap_or_default());
        if count > MAX_SUB_AUTHORITIES {
            return Err(SidError::TooManySubAuthorities { count });
        }
        let expected = HEADER_LEN + count * 4;
        if bytes.len() < expected {
            return Err(SidError::Truncated {
                len: bytes.len(),
                expected,
            });
        }

        let authority = bytes[2..HEADER_LEN]
            .iter()
            .fold(0_u64, |acc, b| (acc << 8) | u64::from(*b));
        let sub_authorities = bytes[HEADER_LEN..expected]
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();

        Ok(Self {
            revision,
            authority,
            sub_authorities,
        })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN + self.sub_authorities.len() * 4);
        out.push(self.revision);
        out.push(u8::try_from(self.sub_authorities.len()).unwrap_or(u8::MAX));
        out.extend_from_slice(&self.authority.to_be_bytes()[2..]);
        for sub in &self.sub_authorities {
            out.extend_from_slice(&sub.to_le_bytes());
        }
        out
    }

    pub fn authority(&self) -> u64 {
        self.authority
    }

    pub fn sub_authorities(&self) -> &[u32] {
        &self.sub_authorities
    }

    pub fn relative_id(&self) -> Result<RelativeId, SidError> {
        self.sub_authorities
            .last()
            .copied()
            .map(RelativeId)
            .ok_or(SidError::NoRelativeId)
    }

    /// The SID with its relative id removed.
    pub fn domain(&self) -> Self {
        let mut subs = self.sub_authorities.clone();
        subs.pop();
        Self {
            revision: self.revision,
            authority: self.authority,
            sub_authorities: subs,
        }
    }

    /// A SID under this domain ending in `rid`.
    pub fn with_relative_id(&self, rid: RelativeId) -> Self {
        let mut subs = self.sub_authorities.clone();
        subs.push(rid.get());
        Self {
            revision: self.revision,
            authority: self.authority,
            sub_authorities: subs,
        }
    }
}

impl fmt::Display for SecurityIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S-{}-{}", self.revision, self.authority)?;
        for sub in &self.sub_authorities {
            write!(f, "-{sub}")?;
        }
        Ok(())
    }
}

impl FromStr for SecurityIdentifier {
    type Err = SidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || SidError::Malformed {
            input: s.to_owned(),
        };
        let mut parts = s.trim().split('-');
        if !parts.next().is_some_and(|p| p.eq_ignore_ascii_case("S")) {
            return Err(malformed());
        }
        let revision = parts
            .next()
            .and_then(|p| p.parse::<u8>().ok())
            .ok_or_else(malformed)?;
        let authority = parts
            .next()
            .and_then(|p| p.parse::<u64>().ok())
            .filter(|a| *a < (1 << 48))
            .ok_or_else(malformed)?;
        let sub_authorities = parts
            .map(|p| p.parse::<u32>().map_err(|_| malformed()))
            .collect::<Result<Vec<_>, _>>()?;
        if sub_authorities.len() > MAX_SUB_AUTHORITIES {
            return Err(SidError::TooManySubAuthorities {
                count: sub_authorities.len(),
            });
        }
        Ok(Self {
            revision,
            authority,
            sub_authorities,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    // S-1-5-21-1004336348-1177238915-682003330-512 (Domain Admins)
    const DOMAIN_ADMINS: [u8; 28] = [
        0x01, 0x05, 0x00, 0x00, 0x00, 0x00, 0x00, 0x05, 0x15, 0x00, 0x00, 0x00, 0xdc, 0xf4,
        0xdc, 0x3b, 0x83, 0x3d, 0x2b, 0x46, 0x82, 0x8b, 0xa6, 0x28, 0x00, 0x02, 0x00, 0x00,
    ];

    #[test]
    fn decodes_binary_sid() {
        let sid = SecurityIdentifier::from_bytes(&DOMAIN_ADMINS).unwrap();
        assert_eq!(sid.to_string(), "S-1-5-21-1004336348-1177238915-682003330-512");
        assert_eq!(sid.relative_id().unwrap(), RelativeId(512));
        assert_eq!(sid.to_bytes(), DOMAIN_ADMINS.to_vec());
    }

    #[test]
    fn parses_string_form() {
        let sid: SecurityIdentifier = "S-1-5-21-1-2-3-1105".parse().unwrap();
        assert_eq!(sid.relative_id().unwrap(), RelativeId(1105));
        assert_eq!(sid.domain().to_string(), "S-1-5-21-1-2-3");
        assert_eq!(
            sid.domain().with_relative_id(RelativeId(1106)).to_string(),
            "S-1-5-21-1-2-3-1106"
        );
    }

    #[test]
    fn rejects_truncated_bytes() {
        let err = SecurityIdentifier::from_bytes(&DOMAIN_ADMINS[..20]).unwrap_err();
        assert_eq!(
            err,
            SidError::Truncated {
                len: 20,
                expected: 28
            }
        );
        assert!(SecurityIdentifier::from_bytes(&[]).is_err());
    }

    #[test]
    fn rejects_malformed_strings() {
        assert!("X-1-5".parse::<SecurityIdentifier>().is_err());
        assert!("S-1-5-abc".parse::<SecurityIdentifier>().is_err());
        assert_eq!(
            "S-1-5".parse::<SecurityIdentifier>().unwrap().relative_id(),
            Err(SidError::NoRelativeId)
        );
    }
}
