// ── Composite placement field ──
//
// The controller takes a gateway's subnet and several placement details
// as one positional string: `subnet~~zone~~insane_az~~private_zone~~oob_az~~ipv6`.
// Absent tokens before a present one keep an empty slot; nothing is
// emitted after the last present token except a single closing
// delimiter when the final (IPv6) slot is absent.
//
// Tokens must not contain the delimiter. Validation upstream guarantees
// this; the codec does not check it.

pub const DELIMITER: &str = "~~";

/// Number of optional tokens after the subnet.
pub const TOKEN_COUNT: usize = 5;

/// Pack `base` and the optional `tokens` (empty means absent).
pub fn encode(base: &str, tokens: &[&str; TOKEN_COUNT]) -> String {
    let Some(last) = tokens.iter().rposition(|token| !token.is_empty()) else {
        return base.to_owned();
    };

    let mut out = String::from(base);
    for token in tokens.iter().take(last + 1) {
        out.push_str(DELIMITER);
        out.push_str(token);
    }
    if last + 1 < TOKEN_COUNT {
        out.push_str(DELIMITER);
    }
    out
}

/// Split an encoded field into the subnet and its positional tokens.
pub fn decode(encoded: &str) -> (String, [String; TOKEN_COUNT]) {
    let trimmed = encoded.strip_suffix(DELIMITER).unwrap_or(encoded);
    let mut parts = trimmed.split(DELIMITER);
    let base = parts.next().unwrap_or_default().to_owned();
    let tokens = std::array::from_fn(|_| parts.next().unwrap_or_default().to_owned());
    (base, tokens)
}

/// Named view over the encoded field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Placement {
    pub subnet: String,
    /// Azure availability zone.
    pub zone: String,
    pub insane_mode_az: String,
    pub private_mode_zone: String,
    pub oob_availability_zone: String,
    pub ipv6_cidr: String,
}

impl Placement {
    pub fn new(subnet: impl Into<String>) -> Self {
        Self {
            subnet: subnet.into(),
            ..Self::default()
        }
    }

    pub fn encode(&self) -> String {
        encode(
            &self.subnet,
            &[
                &self.zone,
                &self.insane_mode_az,
                &self.private_mode_zone,
                &self.oob_availability_zone,
                &self.ipv6_cidr,
            ],
        )
    }

    pub fn decode(encoded: &str) -> Self {
        let (subnet, [zone, insane_mode_az, private_mode_zone, oob_availability_zone, ipv6_cidr]) =
            decode(encoded);
        Self {
            subnet,
            zone,
            insane_mode_az,
            private_mode_zone,
            oob_availability_zone,
            ipv6_cidr,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const VALUES: [&str; TOKEN_COUNT] = [
        "az-2",
        "us-east-1a",
        "us-east-1b",
        "us-east-1c",
        "2600:1f18::/64",
    ];

    #[test]
    fn every_token_combination_round_trips() {
        for mask in 0_u32..(1 << TOKEN_COUNT) {
            let tokens: [&str; TOKEN_COUNT] =
                std::array::from_fn(|i| if mask & (1 << i) == 0 { "" } else { VALUES[i] });

            let encoded = encode("10.0.1.0/24", &tokens);
            let (base, decoded) = decode(&encoded);

            assert_eq!(base, "10.0.1.0/24", "mask {mask:05b}: {encoded}");
            assert_eq!(decoded, tokens.map(str::to_owned), "mask {mask:05b}: {encoded}");
        }
    }

    #[test]
    fn bare_subnet_has_no_delimiter() {
        assert_eq!(encode("10.0.2.0/24", &[""; TOKEN_COUNT]), "10.0.2.0/24");
        assert_eq!(Placement::decode("10.0.2.0/24"), Placement::new("10.0.2.0/24"));
    }

    #[test]
    fn azure_zone_gets_closing_delimiter() {
        let placement = Placement {
            zone: "az-2".into(),
            ..Placement::new("10.0.1.0/24")
        };
        assert_eq!(placement.encode(), "10.0.1.0/24~~az-2~~");
        assert_eq!(Placement::decode("10.0.1.0/24~~az-2~~"), placement);
    }

    #[test]
    fn gaps_keep_empty_slots() {
        let placement = Placement {
            private_mode_zone: "us-east-1a".into(),
            ..Placement::new("10.0.1.0/24")
        };
        assert_eq!(placement.encode(), "10.0.1.0/24~~~~~~us-east-1a~~");
    }

    #[test]
    fn terminal_token_has_no_closing_delimiter() {
        let placement = Placement {
            ipv6_cidr: "2600:1f18::/64".into(),
            ..Placement::new("10.0.1.0/24")
        };
        assert_eq!(placement.encode(), "10.0.1.0/24~~~~~~~~~~2600:1f18::/64");
        assert_eq!(Placement::decode(&placement.encode()), placement);
    }

    #[test]
    fn extra_tokens_are_ignored() {
        let placement = Placement::decode("10.0.1.0/24~~a~~b~~c~~d~~e~~f");
        assert_eq!(placement.ipv6_cidr, "e");
    }
}
