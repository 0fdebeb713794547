use crate::config::ModuleConfig;
use crate::host::{JniHost, take_exception};
use crate::misc::inject_panic_handler;
use crate::{CONTEXT, init_logger, installer};
use anyhow::{Context, Result};
use autoexpand_common::ext::ResultExt;
use autoexpand_core::hooks::{HookId, Phase};
use jni::JNIEnv;
use jni::objects::{JClass, JObject, JString};
use jni::sys::jlong;
use log::{debug, error, info};
use scopeguard::guard;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};

static INSTALLED: AtomicBool = AtomicBool::new(false);

fn on_load_package<'local>(env: &mut JNIEnv<'local>, package: &JString<'local>, loader: &JObject<'local>) -> Result<()> {
    let package: String = env.get_string(package).context("read package name")?.into();

    if package != ModuleConfig::instance().target_package {
        return Ok(());
    }

    if INSTALLED.swap(true, Ordering::AcqRel) {
        debug!("hooks already installed in {package}");
        return Ok(());
    }

    info!("loading into {package}");
    installer::install_all(env, loader);

    Ok(())
}

fn on_hook<'local>(env: &mut JNIEnv<'local>, id: jlong, param: JObject<'local>, phase: Phase) -> Result<()> {
    let id = u32::try_from(id)
        .ok()
        .and_then(HookId::from_repr)
        .with_context(|| format!("unknown hook id {id}"))?;

    let mut host = JniHost::new(env, param);
    CONTEXT.dispatch(&mut host, id, phase);

    Ok(())
}

/// Dispatch one hook callback; nothing may unwind or leave a throwable behind.
fn run_hook<'local>(env: JNIEnv<'local>, id: jlong, param: JObject<'local>, phase: Phase) {
    let mut env = guard(env, |mut env| {
        let (message, _) = take_exception(&mut env);
        if let Some(message) = message {
            debug!("cleared pending exception: {message}");
        }
    });

    let result = panic::catch_unwind(AssertUnwindSafe(|| on_hook(&mut env, id, param, phase)));

    match result {
        Ok(result) => result.log_if_error(),
        Err(_) => error!("hook {id} ({phase}) panicked"),
    }
}

#[unsafe(no_mangle)]
extern "system" fn Java_com_autoexpand_bridge_Entry_nativeLoadPackage<'local>(
    mut env: JNIEnv<'local>,
    _class: JClass<'local>,
    package: JString<'local>,
    loader: JObject<'local>,
) {
    init_logger();
    inject_panic_handler();

    let result = panic::catch_unwind(AssertUnwindSafe(|| on_load_package(&mut env, &package, &loader)));

    match result {
        Ok(result) => result.log_if_error(),
        Err(_) => error!("hook installation panicked"),
    }

    take_exception(&mut env);
}

#[unsafe(no_mangle)]
extern "system" fn Java_com_autoexpand_bridge_NativeHook_nativeBefore<'local>(
    env: JNIEnv<'local>,
    _this: JObject<'local>,
    id: jlong,
    param: JObject<'local>,
) {
    run_hook(env, id, param, Phase::Before)
}

#[unsafe(no_mangle)]
extern "system" fn Java_com_autoexpand_bridge_NativeHook_nativeAfter<'local>(
    env: JNIEnv<'local>,
    _this: JObject<'local>,
    id: jlong,
    param: JObject<'local>,
) {
    run_hook(env, id, param, Phase::After)
}
