//! Capability bitmask.
//!
//! Every permission is one bit of a `u64`. Bits are grouped by subsystem,
//! one byte per group, and the unassigned bits inside each byte are reserved
//! for growth:
//!
//! | Bits  | Group |
//! |-------|-------|
//! | 0–7   | member management |
//! | 8–15  | applications / OAuth clients |
//! | 16–23 | system configuration |
//! | 24–31 | roles and security |
//! | 32–35 | announcements |
//!
//! Announcement bits sit above bit 31, so masks are never narrowed to 32 bits
//! anywhere in this crate. Masks read from the outside keep unknown bits.
//!
//! # Example
//!
//! ```
//! use tessera_permissions::{Capabilities, mask_satisfies, render};
//!
//! let mask = Capabilities::USER_READ | Capabilities::ANNOUNCEMENT_PIN;
//! assert!(mask_satisfies(mask, Capabilities::USER_READ));
//! assert!(mask_satisfies(mask, Capabilities::ANNOUNCEMENT_PIN));
//! assert!(!mask_satisfies(mask, Capabilities::USER_CREATE));
//!
//! assert_eq!(render(mask), vec!["View members", "Pin announcements"]);
//! ```

use bitflags::bitflags;

use crate::error::{PermissionError, PermissionResult};

bitflags! {
    /// A set of capabilities packed into a 64-bit mask.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
    pub struct Capabilities: u64 {
        // Member management (0–7)
        /// View member profiles and listings.
        const USER_READ = 1 << 0;
        /// Create member accounts.
        const USER_CREATE = 1 << 1;
        /// Edit member profiles.
        const USER_UPDATE = 1 << 2;
        /// Delete member accounts.
        const USER_DELETE = 1 << 3;
        /// Suspend and reinstate members.
        const USER_SUSPEND = 1 << 4;
        /// Send membership invitations.
        const USER_INVITE = 1 << 5;

        // Applications / OAuth clients (8–15)
        /// View registered applications.
        const APPLICATION_READ = 1 << 8;
        /// Register applications.
        const APPLICATION_CREATE = 1 << 9;
        /// Edit application settings and redirect URIs.
        const APPLICATION_UPDATE = 1 << 10;
        /// Delete applications.
        const APPLICATION_DELETE = 1 << 11;
        /// Rotate application client secrets.
        const APPLICATION_ROTATE_SECRET = 1 << 12;
        /// Review and revoke granted OAuth consents.
        const APPLICATION_MANAGE_CONSENT = 1 << 13;

        // System configuration (16–23)
        /// View system settings.
        const SYSTEM_CONFIG_READ = 1 << 16;
        /// Change system settings.
        const SYSTEM_CONFIG_UPDATE = 1 << 17;
        /// Read the audit log.
        const SYSTEM_AUDIT_READ = 1 << 18;
        /// Send bulk mail to members.
        const SYSTEM_MAIL_SEND = 1 << 19;
        /// Manage third-party integrations.
        const SYSTEM_INTEGRATIONS_MANAGE = 1 << 20;

        // Roles and security (24–31)
        /// View roles.
        const ROLE_READ = 1 << 24;
        /// Create roles.
        const ROLE_CREATE = 1 << 25;
        /// Edit role names and masks.
        const ROLE_UPDATE = 1 << 26;
        /// Delete roles.
        const ROLE_DELETE = 1 << 27;
        /// Assign roles to members.
        const ROLE_ASSIGN = 1 << 28;
        /// Manage signing keys and security settings.
        const SECURITY_KEYS_MANAGE = 1 << 29;

        // Announcements (32–35)
        /// Publish announcements.
        const ANNOUNCEMENT_CREATE = 1 << 32;
        /// Edit announcements.
        const ANNOUNCEMENT_UPDATE = 1 << 33;
        /// Delete announcements.
        const ANNOUNCEMENT_DELETE = 1 << 34;
        /// Pin announcements.
        const ANNOUNCEMENT_PIN = 1 << 35;
    }
}

impl Capabilities {
    /// Whole member-management byte, for "any of" checks.
    pub const USER_MANAGEMENT: Self = Self::from_bits_retain(0xFF);
    /// Whole application byte, for "any of" checks.
    pub const APPLICATION_MANAGEMENT: Self = Self::from_bits_retain(0xFF << 8);
    /// Whole system-configuration byte, for "any of" checks.
    pub const SYSTEM_MANAGEMENT: Self = Self::from_bits_retain(0xFF << 16);
    /// Whole roles-and-security byte, for "any of" checks.
    pub const RBAC_MANAGEMENT: Self = Self::from_bits_retain(0xFF << 24);
    /// Announcement nibble, for "any of" checks.
    pub const ANNOUNCEMENT_MANAGEMENT: Self = Self::from_bits_retain(0x0F << 32);

    /// Look up a capability by its key (e.g. `"user.read"`).
    #[must_use]
    pub fn lookup(key: &str) -> Option<Self> {
        CAPABILITY_TABLE
            .iter()
            .find(|def| def.key == key)
            .map(|def| def.flag)
    }

    /// Build a mask from capability keys.
    ///
    /// # Errors
    ///
    /// Returns [`PermissionError::UnknownCapability`] for the first key not
    /// in the table.
    pub fn from_keys<I, S>(keys: I) -> PermissionResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        keys.into_iter().try_fold(Self::empty(), |acc, key| {
            let key = key.as_ref();
            Self::lookup(key)
                .map(|flag| acc | flag)
                .ok_or_else(|| PermissionError::UnknownCapability(key.to_owned()))
        })
    }

    /// Parse a raw mask written in decimal or `0x`-prefixed hex.
    ///
    /// Unknown bits are kept.
    ///
    /// # Errors
    ///
    /// Returns [`PermissionError::InvalidMask`] if the text is not an
    /// unsigned 64-bit integer.
    pub fn parse_mask(text: &str) -> PermissionResult<Self> {
        let trimmed = text.trim();
        let parsed = match trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
        {
            Some(hex) => u64::from_str_radix(&hex.replace('_', ""), 16),
            None => trimmed.replace('_', "").parse::<u64>(),
        };
        parsed
            .map(Self::from_bits_retain)
            .map_err(|_| PermissionError::InvalidMask(text.to_owned()))
    }
}

/// One row of the capability table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapabilityDef {
    /// The capability bit.
    pub flag: Capabilities,
    /// Stable machine-readable key.
    pub key: &'static str,
    /// Human-readable label for admin screens.
    pub label: &'static str,
}

const fn def(flag: Capabilities, key: &'static str, label: &'static str) -> CapabilityDef {
    CapabilityDef { flag, key, label }
}

/// Every defined capability in declaration order.
///
/// Rendering walks this table, so output order never depends on how a mask
/// was assembled.
pub const CAPABILITY_TABLE: &[CapabilityDef] = &[
    def(Capabilities::USER_READ, "user.read", "View members"),
    def(Capabilities::USER_CREATE, "user.create", "Create members"),
    def(Capabilities::USER_UPDATE, "user.update", "Edit members"),
    def(Capabilities::USER_DELETE, "user.delete", "Delete members"),
    def(Capabilities::USER_SUSPEND, "user.suspend", "Suspend members"),
    def(Capabilities::USER_INVITE, "user.invite", "Invite members"),
    def(Capabilities::APPLICATION_READ, "application.read", "View applications"),
    def(Capabilities::APPLICATION_CREATE, "application.create", "Register applications"),
    def(Capabilities::APPLICATION_UPDATE, "application.update", "Edit applications"),
    def(Capabilities::APPLICATION_DELETE, "application.delete", "Delete applications"),
    def(
        Capabilities::APPLICATION_ROTATE_SECRET,
        "application.rotate_secret",
        "Rotate client secrets",
    ),
    def(
        Capabilities::APPLICATION_MANAGE_CONSENT,
        "application.manage_consent",
        "Manage OAuth consents",
    ),
    def(Capabilities::SYSTEM_CONFIG_READ, "system.config.read", "View settings"),
    def(Capabilities::SYSTEM_CONFIG_UPDATE, "system.config.update", "Change settings"),
    def(Capabilities::SYSTEM_AUDIT_READ, "system.audit.read", "Read audit log"),
    def(Capabilities::SYSTEM_MAIL_SEND, "system.mail.send", "Send bulk mail"),
    def(
        Capabilities::SYSTEM_INTEGRATIONS_MANAGE,
        "system.integrations.manage",
        "Manage integrations",
    ),
    def(Capabilities::ROLE_READ, "role.read", "View roles"),
    def(Capabilities::ROLE_CREATE, "role.create", "Create roles"),
    def(Capabilities::ROLE_UPDATE, "role.update", "Edit roles"),
    def(Capabilities::ROLE_DELETE, "role.delete", "Delete roles"),
    def(Capabilities::ROLE_ASSIGN, "role.assign", "Assign roles"),
    def(Capabilities::SECURITY_KEYS_MANAGE, "security.keys.manage", "Manage signing keys"),
    def(Capabilities::ANNOUNCEMENT_CREATE, "announcement.create", "Publish announcements"),
    def(Capabilities::ANNOUNCEMENT_UPDATE, "announcement.update", "Edit announcements"),
    def(Capabilities::ANNOUNCEMENT_DELETE, "announcement.delete", "Delete announcements"),
    def(Capabilities::ANNOUNCEMENT_PIN, "announcement.pin", "Pin announcements"),
];

/// Whether `mask` holds every bit of `required`: `(mask & required) == required`.
///
/// An empty requirement is never satisfied.
#[must_use]
pub fn mask_satisfies(mask: Capabilities, required: Capabilities) -> bool {
    !required.is_empty() && mask.contains(required)
}

/// Whether `mask` holds at least one bit of `group`.
///
/// Only for deliberate "any of this group" checks (e.g. showing an admin
/// menu); authorization of a single action uses [`mask_satisfies`].
#[must_use]
pub fn mask_intersects(mask: Capabilities, group: Capabilities) -> bool {
    mask.intersects(group)
}

/// Whether an actor holding `actor` may hand out `grant` (role create, edit
/// or assign). Nobody can grant a capability they do not hold themselves.
#[must_use]
pub fn can_delegate(actor: Capabilities, grant: Capabilities) -> bool {
    actor.contains(grant)
}

/// Labels of the capabilities present in `mask`, in table order.
#[must_use]
pub fn render(mask: Capabilities) -> Vec<&'static str> {
    present(mask).map(|def| def.label).collect()
}

/// Keys of the capabilities present in `mask`, in table order.
#[must_use]
pub fn render_keys(mask: Capabilities) -> Vec<&'static str> {
    present(mask).map(|def| def.key).collect()
}

fn present(mask: Capabilities) -> impl Iterator<Item = &'static CapabilityDef> {
    CAPABILITY_TABLE
        .iter()
        .filter(move |def| mask.contains(def.flag))
}
