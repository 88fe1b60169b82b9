//! Wallet registry entries
//!
//! Descriptors for wallet-list UIs: one generic entry plus entries pinned to
//! a login method. All three variants front the same connector; only the
//! presented identity and the initial login type differ.

use okto_client::{LoginType, SocialProvider};

use crate::connector::{ConnectorOptions, OktoConnector};

/// Which wallet-list entry the user picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalletKind {
    /// Hosted auth page, user picks the method there.
    Generic,
    Google,
    Email,
}

impl WalletKind {
    /// Login flow this entry starts with. Email has no dedicated token flow;
    /// it goes through the hosted page like the generic entry.
    pub fn login_type(&self) -> LoginType {
        match self {
            WalletKind::Google => LoginType::Social(SocialProvider::Google),
            WalletKind::Generic | WalletKind::Email => LoginType::Generic,
        }
    }
}

/// Static identity of a wallet-list entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletDescriptor {
    pub id: &'static str,
    pub name: &'static str,
    pub short_name: &'static str,
    pub icon_url: &'static str,
    pub icon_background: &'static str,
    pub kind: WalletKind,
}

const ICON_BACKGROUND: &str = "#ffffff";

/// Descriptor for one wallet-list entry.
pub fn okto_wallet(kind: WalletKind) -> WalletDescriptor {
    match kind {
        WalletKind::Generic => WalletDescriptor {
            id: "okto-sdk-generic",
            name: "Okto SDK",
            short_name: "Okto",
            icon_url: "https://docs.okto.tech/images/brand-kit/icons/icon.png",
            icon_background: ICON_BACKGROUND,
            kind,
        },
        WalletKind::Google => WalletDescriptor {
            id: "okto-sdk-google",
            name: "Login with Google",
            short_name: "Google",
            icon_url: "https://docs.okto.tech/images/brand-kit/icons/google.png",
            icon_background: ICON_BACKGROUND,
            kind,
        },
        WalletKind::Email => WalletDescriptor {
            id: "okto-sdk-email",
            name: "Login with Email",
            short_name: "Email",
            icon_url: "https://docs.okto.tech/images/brand-kit/icons/email.png",
            icon_background: ICON_BACKGROUND,
            kind,
        },
    }
}

/// All registry entries, in display order.
pub fn all_wallets() -> Vec<WalletDescriptor> {
    vec![
        okto_wallet(WalletKind::Generic),
        okto_wallet(WalletKind::Google),
        okto_wallet(WalletKind::Email),
    ]
}

/// Build a connector for a wallet-list entry.
pub fn create_connector(mut options: ConnectorOptions, kind: WalletKind) -> OktoConnector {
    options.login_type = kind.login_type();
    OktoConnector::new(options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_identities() {
        let generic = okto_wallet(WalletKind::Generic);
        assert_eq!(generic.id, "okto-sdk-generic");
        assert_eq!(generic.name, "Okto SDK");

        let google = okto_wallet(WalletKind::Google);
        assert_eq!(google.id, "okto-sdk-google");
        assert_eq!(google.name, "Login with Google");
        assert!(google.icon_url.ends_with("google.png"));

        let email = okto_wallet(WalletKind::Email);
        assert_eq!(email.id, "okto-sdk-email");
        assert_eq!(email.name, "Login with Email");
    }

    #[test]
    fn test_all_entries_share_icon_background() {
        let wallets = all_wallets();
        assert_eq!(wallets.len(), 3);
        assert!(wallets.iter().all(|w| w.icon_background == "#ffffff"));
    }

    #[test]
    fn test_login_types() {
        assert_eq!(
            WalletKind::Google.login_type(),
            LoginType::Social(SocialProvider::Google)
        );
        assert_eq!(WalletKind::Generic.login_type(), LoginType::Generic);
        assert_eq!(WalletKind::Email.login_type(), LoginType::Generic);
    }
}
