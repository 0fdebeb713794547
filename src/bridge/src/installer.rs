use crate::host::call;
use anyhow::{Result, ensure};
use autoexpand_core::hooks::{HookTarget, Params, targets};
use jni::JNIEnv;
use jni::objects::{JObject, JValue};
use log::{debug, info, warn};

const HELPERS: &str = "de/robv/android/xposed/XposedHelpers";
const BRIDGE: &str = "de/robv/android/xposed/XposedBridge";
const NATIVE_HOOK: &str = "com/autoexpand/bridge/NativeHook";

fn new_callback<'local>(env: &mut JNIEnv<'local>, target: &HookTarget) -> Result<JObject<'local>> {
    call(env, |env| {
        env.new_object(NATIVE_HOOK, "(J)V", &[JValue::Long(target.id as u32 as i64)])
    })
}

fn hook_exact<'local>(
    env: &mut JNIEnv<'local>,
    loader: &JObject<'local>,
    target: &HookTarget,
    params: &[&str],
) -> Result<()> {
    let callback = new_callback(env, target)?;

    call(env, |env| {
        let array = env.new_object_array(params.len() as i32 + 1, "java/lang/Object", JObject::null())?;
        for (index, param) in params.iter().enumerate() {
            let name = env.new_string(*param)?;
            env.set_object_array_element(&array, index as i32, name)?;
        }
        env.set_object_array_element(&array, params.len() as i32, &callback)?;

        let class = env.new_string(target.class)?;
        let method = env.new_string(target.method)?;

        env.call_static_method(
            HELPERS,
            "findAndHookMethod",
            "(Ljava/lang/String;Ljava/lang/ClassLoader;Ljava/lang/String;[Ljava/lang/Object;)Lde/robv/android/xposed/XC_MethodHook$Unhook;",
            &[
                JValue::Object(&class),
                JValue::Object(loader),
                JValue::Object(&method),
                JValue::Object(&array),
            ],
        )?
        .l()
    })?;

    Ok(())
}

fn hook_all<'local>(env: &mut JNIEnv<'local>, loader: &JObject<'local>, target: &HookTarget) -> Result<()> {
    let callback = new_callback(env, target)?;

    let count = call(env, |env| {
        let name = env.new_string(target.class)?;
        let class = env
            .call_static_method(
                HELPERS,
                "findClass",
                "(Ljava/lang/String;Ljava/lang/ClassLoader;)Ljava/lang/Class;",
                &[JValue::Object(&name), JValue::Object(loader)],
            )?
            .l()?;
        let method = env.new_string(target.method)?;

        let unhooks = env
            .call_static_method(
                BRIDGE,
                "hookAllMethods",
                "(Ljava/lang/Class;Ljava/lang/String;Lde/robv/android/xposed/XC_MethodHook;)Ljava/util/Set;",
                &[JValue::Object(&class), JValue::Object(&method), JValue::Object(&callback)],
            )?
            .l()?;

        env.call_method(&unhooks, "size", "()I", &[])?.i()
    })?;

    ensure!(count > 0, "no overloads of {}.{}", target.class, target.method);
    debug!("{}.{}: {count} overloads", target.class, target.method);

    Ok(())
}

fn install<'local>(env: &mut JNIEnv<'local>, loader: &JObject<'local>, target: &HookTarget) -> Result<()> {
    match target.params {
        Params::Exact(params) => hook_exact(env, loader, target, params),
        Params::AllOverloads => hook_all(env, loader, target),
    }
}

/// Register every hook target against the host class loader.
///
/// Targets missing on this build are skipped; the rest still go in.
pub fn install_all<'local>(env: &mut JNIEnv<'local>, loader: &JObject<'local>) -> usize {
    let mut installed = 0;

    for target in targets() {
        match install(env, loader, &target) {
            Ok(()) => installed += 1,
            Err(err) => warn!("skip {} ({}.{}): {err:?}", target.id, target.class, target.method),
        }
    }

    info!("installed {installed} hooks");

    installed
}
