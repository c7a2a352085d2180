use std::str::FromStr;

use crate::config::Config;

const ICE_SECTION: &str = "Ice";
const DEFAULT_CANDIDATE_POOL_SIZE: u8 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IceServer {
    pub urls: Vec<String>,
    pub username: Option<String>,
    pub credential: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BundlePolicy {
    Balanced,
    MaxCompat,
    #[default]
    MaxBundle,
}

impl FromStr for BundlePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "balanced" => Ok(Self::Balanced),
            "max-compat" => Ok(Self::MaxCompat),
            "max-bundle" => Ok(Self::MaxBundle),
            other => Err(format!("unknown bundle policy '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IceTransportPolicy {
    #[default]
    All,
    /// TURN only.
    Relay,
}

impl FromStr for IceTransportPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Self::All),
            "relay" => Ok(Self::Relay),
            other => Err(format!("unknown transport policy '{other}'")),
        }
    }
}

/// Opaque ICE settings handed to the [`PeerConnectionFactory`].
///
/// No servers are built in; STUN/TURN come from the `[Ice]` config section.
///
/// [`PeerConnectionFactory`]: crate::negotiation::PeerConnectionFactory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RtcConfiguration {
    pub ice_servers: Vec<IceServer>,
    pub candidate_pool_size: u8,
    pub bundle_policy: BundlePolicy,
    pub ice_transport_policy: IceTransportPolicy,
}

impl Default for RtcConfiguration {
    fn default() -> Self {
        Self {
            ice_servers: Vec::new(),
            candidate_pool_size: DEFAULT_CANDIDATE_POOL_SIZE,
            bundle_policy: BundlePolicy::default(),
            ice_transport_policy: IceTransportPolicy::default(),
        }
    }
}

impl RtcConfiguration {
    /// Reads `[Ice] stun_urls, turn_urls, turn_username, turn_credential,
    /// candidate_pool_size, bundle_policy, transport_policy`.
    ///
    /// # Errors
    /// A value that does not parse, or TURN urls without credentials.
    pub fn from_config(config: &Config) -> Result<Self, String> {
        let mut ice_servers = Vec::new();

        let stun_urls = config.get_list(ICE_SECTION, "stun_urls");
        if !stun_urls.is_empty() {
            ice_servers.push(IceServer {
                urls: stun_urls,
                username: None,
                credential: None,
            });
        }

        let turn_urls = config.get_list(ICE_SECTION, "turn_urls");
        if !turn_urls.is_empty() {
            let username = config.get_non_empty(ICE_SECTION, "turn_username");
            let credential = config.get_non_empty(ICE_SECTION, "turn_credential");
            let (Some(username), Some(credential)) = (username, credential) else {
                return Err("[Ice] turn_urls set without turn_username/turn_credential".into());
            };
            ice_servers.push(IceServer {
                urls: turn_urls,
                username: Some(username.to_string()),
                credential: Some(credential.to_string()),
            });
        }

        Ok(Self {
            ice_servers,
            candidate_pool_size: config
                .get_parsed(ICE_SECTION, "candidate_pool_size")?
                .unwrap_or(DEFAULT_CANDIDATE_POOL_SIZE),
            bundle_policy: config
                .get_parsed(ICE_SECTION, "bundle_policy")?
                .unwrap_or_default(),
            ice_transport_policy: config
                .get_parsed(ICE_SECTION, "transport_policy")?
                .unwrap_or_default(),
        })
    }
}
