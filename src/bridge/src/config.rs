use autoexpand_common::props;
use autoexpand_core::hooks::SYSTEMUI_PACKAGE;
use std::sync::OnceLock;

static INSTANCE: OnceLock<ModuleConfig> = OnceLock::new();

const PROVIDER_URI: &str = "content://com.autoexpand.xposed.prefs";

#[derive(Debug)]
pub struct ModuleConfig {
    pub target_package: String,
    pub provider_uri: String,
}

impl ModuleConfig {
    pub fn instance() -> &'static Self {
        INSTANCE.get_or_init(Self::load)
    }

    fn load() -> Self {
        let mut config = Self {
            target_package: SYSTEMUI_PACKAGE.into(),
            provider_uri: PROVIDER_URI.into(),
        };

        if cfg!(debug_assertions)
            && let Some(uri) = props::get("debug.autoexpand.provider")
            && !uri.is_empty()
        {
            config.provider_uri = uri.to_string();
        }

        config
    }
}
