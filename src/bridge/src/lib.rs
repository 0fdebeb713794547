use autoexpand_common::props;
use autoexpand_core::capability::MemberProbe;
use autoexpand_core::{HookContext, SystemClock};
use jni::objects::{GlobalRef, WeakRef};
use log::LevelFilter;
use once_cell::sync::Lazy;
use std::sync::{Arc, OnceLock};

mod config;
mod entry;
mod host;
mod installer;
mod misc;

static CONTEXT: Lazy<HookContext<WeakRef>> = Lazy::new(|| HookContext::new(Arc::new(SystemClock)));

static MEMBERS: Lazy<MemberProbe> = Lazy::new(MemberProbe::new);

/// The SystemUI `Application`, captured from its `onCreate`.
static APP_CONTEXT: OnceLock<GlobalRef> = OnceLock::new();

fn init_logger() {
    let verbose = props::get("persist.autoexpand.verbose")
        .and_then(|it| it.as_bool())
        .unwrap_or(cfg!(debug_assertions));

    android_logger::init_once(
        android_logger::Config::default()
            .with_max_level(if verbose {
                LevelFilter::Debug
            } else {
                LevelFilter::Info
            })
            .with_tag("autoexpand"),
    );
}
