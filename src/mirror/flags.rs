//! One-shot session flags.
//!
//! Flags carry a signal across exactly one navigation transition
//! (e.g. "show a success banner on the next screen"). The contract is
//! write-once, read-once: `take_*` consumes and deletes the flag, so a
//! stale flag can never re-trigger.

use crate::error::Result;
use crate::mirror::{keys, LocalMirror};

/// Banner severity persisted alongside the banner message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerKind {
    Success,
    Error,
}

impl BannerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BannerKind::Success => "success",
            BannerKind::Error => "error",
        }
    }

    /// Unknown values decode as `Error`: a mangled flag should never
    /// present as a success.
    fn from_str(raw: &str) -> Self {
        match raw {
            "success" => BannerKind::Success,
            _ => BannerKind::Error,
        }
    }
}

/// A consumed one-shot banner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub kind: BannerKind,
    pub message: String,
}

/// One-shot flag channel over a local mirror.
pub struct SessionFlags<'a, M: LocalMirror> {
    mirror: &'a M,
}

impl<'a, M: LocalMirror> SessionFlags<'a, M> {
    pub fn new(mirror: &'a M) -> Self {
        Self { mirror }
    }

    pub async fn set_banner(&self, kind: BannerKind, message: &str) -> Result<()> {
        self.mirror.set(keys::BANNER_MESSAGE, message).await?;
        self.mirror.set(keys::BANNER_TYPE, kind.as_str()).await
    }

    /// Consume the pending banner, if any. Both keys are deleted before
    /// the banner is returned.
    pub async fn take_banner(&self) -> Result<Option<Banner>> {
        let message = self.mirror.get(keys::BANNER_MESSAGE).await?;
        let kind = self.mirror.get(keys::BANNER_TYPE).await?;
        self.mirror.remove(keys::BANNER_MESSAGE).await?;
        self.mirror.remove(keys::BANNER_TYPE).await?;

        Ok(message.map(|message| Banner {
            kind: kind.as_deref().map(BannerKind::from_str).unwrap_or(BannerKind::Error),
            message,
        }))
    }

    pub async fn set_force_reload(&self) -> Result<()> {
        self.mirror.set(keys::FORCE_RELOAD, "true").await
    }

    /// Consume the force-reload flag. Returns whether it was set.
    pub async fn take_force_reload(&self) -> Result<bool> {
        let set = self.mirror.get(keys::FORCE_RELOAD).await?.is_some();
        if set {
            self.mirror.remove(keys::FORCE_RELOAD).await?;
        }
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mirror::MemoryMirror;

    #[tokio::test]
    async fn banner_is_read_once() {
        let mirror = MemoryMirror::new();
        let flags = SessionFlags::new(&mirror);

        flags.set_banner(BannerKind::Success, "Saved").await.unwrap();

        let banner = flags.take_banner().await.unwrap().unwrap();
        assert_eq!(banner.kind, BannerKind::Success);
        assert_eq!(banner.message, "Saved");

        assert!(flags.take_banner().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn force_reload_is_read_once() {
        let mirror = MemoryMirror::new();
        let flags = SessionFlags::new(&mirror);

        assert!(!flags.take_force_reload().await.unwrap());
        flags.set_force_reload().await.unwrap();
        assert!(flags.take_force_reload().await.unwrap());
        assert!(!flags.take_force_reload().await.unwrap());
    }

    #[tokio::test]
    async fn mangled_banner_kind_reads_as_error() {
        let mirror = MemoryMirror::new();
        mirror.set(keys::BANNER_MESSAGE, "??").await.unwrap();
        mirror.set(keys::BANNER_TYPE, "celebration").await.unwrap();

        let banner = SessionFlags::new(&mirror).take_banner().await.unwrap().unwrap();
        assert_eq!(banner.kind, BannerKind::Error);
    }
}
