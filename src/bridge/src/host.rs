use crate::config::ModuleConfig;
use crate::{APP_CONTEXT, MEMBERS};
use anyhow::{Context, Result, anyhow, bail};
use autoexpand_core::config::{ConfigRow, ConfigSource};
use autoexpand_core::gesture::TouchEvent;
use autoexpand_core::reflect::{Arg, Host, Invocation, Member, Reflect, SettingsStore};
use jni::JNIEnv;
use jni::errors::Error as JniError;
use jni::objects::{JObject, JObjectArray, JString, JValue, WeakRef};
use log::{debug, info};

const CURSOR_SIG: &str = "(Landroid/net/Uri;[Ljava/lang/String;Ljava/lang/String;[Ljava/lang/String;Ljava/lang/String;)Landroid/database/Cursor;";

fn to_jvalue(arg: &Arg) -> JValue<'static, 'static> {
    match *arg {
        Arg::Bool(value) => JValue::Bool(u8::from(value)),
        Arg::Int(value) => JValue::Int(value),
    }
}

/// Run a JNI call, turning a pending Java throwable into an error.
///
/// The flag reports whether the failure was an absent field or method.
fn guarded<'local, T>(
    env: &mut JNIEnv<'local>,
    f: impl FnOnce(&mut JNIEnv<'local>) -> jni::errors::Result<T>,
) -> Result<T, (anyhow::Error, bool)> {
    match f(env) {
        Ok(value) => Ok(value),
        Err(err) => {
            let missing = matches!(
                err,
                JniError::MethodNotFound { .. } | JniError::FieldNotFound { .. }
            );
            let (message, thrown_missing) = take_exception(env);
            let err = match message {
                Some(message) => anyhow!("{err}: {message}"),
                None => anyhow!("{err}"),
            };
            Err((err, missing || thrown_missing))
        }
    }
}

pub(crate) fn take_exception(env: &mut JNIEnv) -> (Option<String>, bool) {
    let Ok(throwable) = env.exception_occurred() else {
        return (None, false);
    };

    if throwable.is_null() {
        return (None, false);
    }

    let _ = env.exception_clear();

    let missing = ["java/lang/NoSuchMethodError", "java/lang/NoSuchFieldError"]
        .iter()
        .any(|class| env.is_instance_of(&throwable, *class).unwrap_or(false));

    let message = env
        .call_method(&throwable, "toString", "()Ljava/lang/String;", &[])
        .and_then(|it| it.l())
        .ok()
        .and_then(|it| env.get_string(&JString::from(it)).ok().map(String::from));

    let _ = env.exception_clear();

    (message, missing)
}

/// Framework and hooking-API calls, which exist on every supported build.
pub(crate) fn call<'local, T>(
    env: &mut JNIEnv<'local>,
    f: impl FnOnce(&mut JNIEnv<'local>) -> jni::errors::Result<T>,
) -> Result<T> {
    guarded(env, f).map_err(|(err, _)| err)
}

/// Access a host member; absent members are remembered and skipped afterwards.
fn member<'local, T>(
    env: &mut JNIEnv<'local>,
    member: &Member,
    f: impl FnOnce(&mut JNIEnv<'local>) -> jni::errors::Result<T>,
) -> Result<T> {
    MEMBERS.ensure(member)?;

    guarded(env, f).map_err(|(err, missing)| {
        if missing {
            MEMBERS.mark_missing(member);
        }
        err.context(format!("access {member}"))
    })
}

/// One `XC_MethodHook.MethodHookParam` in flight, plus the JNI env it arrived on.
pub struct JniHost<'a, 'local> {
    env: &'a mut JNIEnv<'local>,
    param: JObject<'local>,
}

impl<'a, 'local> JniHost<'a, 'local> {
    pub fn new(env: &'a mut JNIEnv<'local>, param: JObject<'local>) -> Self {
        Self { env, param }
    }

    fn non_null(obj: JObject<'local>) -> Option<JObject<'local>> {
        (!obj.is_null()).then_some(obj)
    }

    fn arg_array(&mut self) -> Result<JObjectArray<'local>> {
        let array = call(self.env, |env| env.get_field(&self.param, "args", "[Ljava/lang/Object;")?.l())?;
        Ok(JObjectArray::from(array))
    }

    fn arg(&mut self, index: usize) -> Result<Option<JObject<'local>>> {
        let array = self.arg_array()?;
        let obj = call(self.env, |env| env.get_object_array_element(&array, index as i32))?;
        Ok(Self::non_null(obj))
    }

    fn result(&mut self) -> Result<Option<JObject<'local>>> {
        let obj = call(self.env, |env| env.call_method(&self.param, "getResult", "()Ljava/lang/Object;", &[])?.l())?;
        Ok(Self::non_null(obj))
    }

    fn set_result(&mut self, value: &JObject<'local>) -> Result<()> {
        call(self.env, |env| {
            env.call_method(&self.param, "setResult", "(Ljava/lang/Object;)V", &[JValue::Object(value)])?
                .v()
        })
    }

    fn string(&mut self, obj: JObject<'local>) -> Result<String> {
        let string = JString::from(obj);
        call(self.env, |env| env.get_string(&string).map(Into::into))
    }

    fn content_resolver(&mut self) -> Result<JObject<'local>> {
        let context = APP_CONTEXT.get().context("host context not captured yet")?;

        call(self.env, |env| {
            env.call_method(
                context.as_obj(),
                "getContentResolver",
                "()Landroid/content/ContentResolver;",
                &[],
            )?
            .l()
        })
    }

    fn cursor_string(&mut self, cursor: &JObject<'local>, column: i32) -> Result<String> {
        let value = call(self.env, |env| {
            env.call_method(cursor, "getString", "(I)Ljava/lang/String;", &[JValue::Int(column)])?
                .l()
        })?;

        let value = Self::non_null(value).with_context(|| format!("null in column {column}"))?;
        let string = self.string(value)?;

        Ok(string)
    }

    fn read_rows(&mut self, cursor: &JObject<'local>) -> Result<Vec<ConfigRow>> {
        let mut rows = Vec::new();

        while call(self.env, |env| env.call_method(cursor, "moveToNext", "()Z", &[])?.z())? {
            let key = self.cursor_string(cursor, 0)?;
            let kind = self.cursor_string(cursor, 1)?;
            let value = self.cursor_string(cursor, 2)?;
            rows.push(ConfigRow { key, kind, value });
        }

        Ok(rows)
    }
}

impl<'local> Reflect for JniHost<'_, 'local> {
    type Object = JObject<'local>;
    type Weak = WeakRef;

    fn call_object(&mut self, obj: &JObject<'local>, method: &Member) -> Result<Option<JObject<'local>>> {
        let value = member(self.env, method, |env| env.call_method(obj, method.name, method.sig, &[])?.l())?;
        Ok(Self::non_null(value))
    }

    fn call_string(&mut self, obj: &JObject<'local>, method: &Member) -> Result<Option<String>> {
        match self.call_object(obj, method)? {
            Some(value) => Ok(Some(self.string(value)?)),
            None => Ok(None),
        }
    }

    fn call_int(&mut self, obj: &JObject<'local>, method: &Member) -> Result<i32> {
        member(self.env, method, |env| env.call_method(obj, method.name, method.sig, &[])?.i())
    }

    fn call_void(&mut self, obj: &JObject<'local>, method: &Member, args: &[Arg]) -> Result<()> {
        let args: Vec<_> = args.iter().map(to_jvalue).collect();
        member(self.env, method, |env| env.call_method(obj, method.name, method.sig, &args)?.v())
    }

    fn get_object_field(&mut self, obj: &JObject<'local>, field: &Member) -> Result<Option<JObject<'local>>> {
        let value = member(self.env, field, |env| env.get_field(obj, field.name, field.sig)?.l())?;
        Ok(Self::non_null(value))
    }

    fn get_bool_field(&mut self, obj: &JObject<'local>, field: &Member) -> Result<bool> {
        member(self.env, field, |env| env.get_field(obj, field.name, field.sig)?.z())
    }

    fn set_bool_field(&mut self, obj: &JObject<'local>, field: &Member, value: bool) -> Result<()> {
        member(self.env, field, |env| {
            env.set_field(obj, field.name, field.sig, JValue::Bool(u8::from(value)))
        })
    }

    fn class_name(&mut self, obj: &JObject<'local>) -> Result<String> {
        let name = call(self.env, |env| {
            let class = env.call_method(obj, "getClass", "()Ljava/lang/Class;", &[])?.l()?;
            env.call_method(&class, "getName", "()Ljava/lang/String;", &[])?.l()
        })?;

        self.string(name)
    }

    fn identity_hash(&mut self, obj: &JObject<'local>) -> Result<i32> {
        call(self.env, |env| {
            env.call_static_method(
                "java/lang/System",
                "identityHashCode",
                "(Ljava/lang/Object;)I",
                &[JValue::Object(obj)],
            )?
            .i()
        })
    }

    fn downgrade(&mut self, obj: &JObject<'local>) -> Result<WeakRef> {
        call(self.env, |env| env.new_weak_ref(obj))?
            .context("cannot take a weak reference to null")
    }

    fn upgrade(&mut self, weak: &WeakRef) -> Option<JObject<'local>> {
        weak.upgrade_local(self.env).ok().flatten()
    }

    fn refers_to(&mut self, weak: &WeakRef, obj: &JObject<'local>) -> bool {
        weak.is_same_object(self.env, obj).unwrap_or(false)
    }

    fn is_collected(&mut self, weak: &WeakRef) -> bool {
        weak.is_garbage_collected(self.env).unwrap_or(true)
    }
}

impl Invocation for JniHost<'_, '_> {
    fn this_object(&mut self) -> Result<Self::Object> {
        let this = call(self.env, |env| env.get_field(&self.param, "thisObject", "Ljava/lang/Object;")?.l())?;
        Self::non_null(this).context("static invocation has no receiver")
    }

    fn args(&mut self) -> Result<Vec<Option<Self::Object>>> {
        let array = self.arg_array()?;
        let len = call(self.env, |env| env.get_array_length(&array))?;

        (0..len)
            .map(|index| {
                let obj = call(self.env, |env| env.get_object_array_element(&array, index))?;
                Ok(Self::non_null(obj))
            })
            .collect()
    }

    fn arg_bool(&mut self, index: usize) -> Result<bool> {
        let boxed = self.arg(index)?.with_context(|| format!("arg {index} is null"))?;
        call(self.env, |env| env.call_method(&boxed, "booleanValue", "()Z", &[])?.z())
    }

    fn set_arg_bool(&mut self, index: usize, value: bool) -> Result<()> {
        let array = self.arg_array()?;

        call(self.env, |env| {
            let boxed = env
                .call_static_method(
                    "java/lang/Boolean",
                    "valueOf",
                    "(Z)Ljava/lang/Boolean;",
                    &[JValue::Bool(u8::from(value))],
                )?
                .l()?;
            env.set_object_array_element(&array, index as i32, boxed)
        })
    }

    fn arg_touch(&mut self, index: usize) -> Result<TouchEvent> {
        let event = self.arg(index)?.with_context(|| format!("arg {index} is null"))?;

        let (action, raw_y) = call(self.env, |env| {
            let action = env.call_method(&event, "getActionMasked", "()I", &[])?.i()?;
            let raw_y = env.call_method(&event, "getRawY", "()F", &[])?.f()?;
            Ok((action, raw_y))
        })?;

        Ok(TouchEvent {
            action: action.into(),
            raw_y,
        })
    }

    fn result_bool(&mut self) -> Result<bool> {
        match self.result()? {
            Some(boxed) => call(self.env, |env| env.call_method(&boxed, "booleanValue", "()Z", &[])?.z()),
            None => Ok(false),
        }
    }

    fn result_int(&mut self) -> Result<i32> {
        let boxed = self.result()?.context("result is null")?;
        call(self.env, |env| env.call_method(&boxed, "intValue", "()I", &[])?.i())
    }

    fn set_result_int(&mut self, value: i32) -> Result<()> {
        let boxed = call(self.env, |env| {
            env.call_static_method(
                "java/lang/Integer",
                "valueOf",
                "(I)Ljava/lang/Integer;",
                &[JValue::Int(value)],
            )?
            .l()
        })?;

        self.set_result(&boxed)
    }

    fn skip_original(&mut self) -> Result<()> {
        self.set_result(&JObject::null())
    }
}

impl ConfigSource for JniHost<'_, '_> {
    fn fetch(&mut self) -> Result<Vec<ConfigRow>> {
        let resolver = self.content_resolver()?;
        let uri = ModuleConfig::instance().provider_uri.as_str();

        let cursor = call(self.env, |env| {
            let uri = env.new_string(uri)?;
            let uri = env
                .call_static_method(
                    "android/net/Uri",
                    "parse",
                    "(Ljava/lang/String;)Landroid/net/Uri;",
                    &[JValue::Object(&uri)],
                )?
                .l()?;

            let null = JObject::null();
            env.call_method(
                &resolver,
                "query",
                CURSOR_SIG,
                &[
                    JValue::Object(&uri),
                    JValue::Object(&null),
                    JValue::Object(&null),
                    JValue::Object(&null),
                    JValue::Object(&null),
                ],
            )?
            .l()
        })?;

        let Some(cursor) = Self::non_null(cursor) else {
            bail!("provider {uri} returned no cursor");
        };

        let rows = self.read_rows(&cursor);

        if let Err(err) = call(self.env, |env| env.call_method(&cursor, "close", "()V", &[])?.v()) {
            debug!("failed to close cursor: {err:?}");
        }

        rows
    }

    fn is_ready(&self) -> bool {
        APP_CONTEXT.get().is_some()
    }
}

impl SettingsStore for JniHost<'_, '_> {
    fn put_global_string(&mut self, name: &str, value: &str) -> Result<()> {
        let resolver = self.content_resolver()?;

        let written = call(self.env, |env| {
            let name = env.new_string(name)?;
            let value = env.new_string(value)?;
            env.call_static_method(
                "android/provider/Settings$Global",
                "putString",
                "(Landroid/content/ContentResolver;Ljava/lang/String;Ljava/lang/String;)Z",
                &[JValue::Object(&resolver), JValue::Object(&name), JValue::Object(&value)],
            )?
            .z()
        })?;

        if !written {
            bail!("settings provider rejected {name}");
        }

        Ok(())
    }
}

impl Host for JniHost<'_, '_> {
    fn bind_context(&mut self, context: &Self::Object) -> Result<()> {
        if APP_CONTEXT.get().is_some() {
            return Ok(());
        }

        let global = call(self.env, |env| env.new_global_ref(context))?;

        if APP_CONTEXT.set(global).is_ok() {
            info!("captured host application context");
        }

        Ok(())
    }
}
