use crate::clock::Clock;
use crate::config::{ConfigRow, ConfigSource};
use crate::gesture::TouchEvent;
use crate::reflect::{Arg, Host, Invocation, Member, Reflect, SettingsStore};
use anyhow::{Context, Result, anyhow, bail};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI32, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

const ROW_CLASS: &str = "com.android.systemui.statusbar.notification.row.ExpandableNotificationRow";
const CONTENT_VIEW_CLASS: &str =
    "com.android.systemui.statusbar.notification.row.NotificationContentView";

static NEXT_HASH: AtomicI32 = AtomicI32::new(1);

pub struct ManualClock(AtomicU64);

impl ManualClock {
    pub fn new(now: u64) -> Self {
        Self(AtomicU64::new(now))
    }

    pub fn advance(&self, millis: u64) {
        self.0.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct ScriptedSource {
    rows: Option<Vec<ConfigRow>>,
    pub ready: bool,
    pub fetches: usize,
}

impl ScriptedSource {
    pub fn rows(rows: Vec<ConfigRow>) -> Self {
        Self {
            rows: Some(rows),
            ready: true,
            fetches: 0,
        }
    }

    pub fn failing() -> Self {
        Self {
            rows: None,
            ready: true,
            fetches: 0,
        }
    }
}

impl ConfigSource for ScriptedSource {
    fn fetch(&mut self) -> Result<Vec<ConfigRow>> {
        self.fetches += 1;
        self.rows.clone().context("provider unreachable")
    }

    fn is_ready(&self) -> bool {
        self.ready
    }
}

#[derive(Debug, Clone)]
pub enum FakeValue {
    Bool(bool),
    Int(i32),
    Str(Option<String>),
    Object(Option<FakeObject>),
    Touch(TouchEvent),
}

pub struct FakeInner {
    class: String,
    hash: AtomicI32,
    fields: Mutex<HashMap<String, FakeValue>>,
    methods: Mutex<HashMap<String, FakeValue>>,
    calls: Mutex<Vec<(String, Vec<Arg>)>>,
}

/// A host object with scripted fields and methods that records its calls.
#[derive(Clone)]
pub struct FakeObject(Arc<FakeInner>);

impl std::fmt::Debug for FakeObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "FakeObject({})", self.0.class)
    }
}

#[derive(Clone)]
pub struct FakeWeak(Weak<FakeInner>);

impl FakeObject {
    pub fn new(class: &str) -> Self {
        Self(Arc::new(FakeInner {
            class: class.into(),
            hash: AtomicI32::new(NEXT_HASH.fetch_add(1, Ordering::Relaxed)),
            fields: Mutex::default(),
            methods: Mutex::default(),
            calls: Mutex::default(),
        }))
    }

    /// A row whose entry resolves to a notification posted by `app`.
    pub fn row_of(app: &str) -> Self {
        let sbn = FakeObject::new("android.service.notification.StatusBarNotification")
            .with_method("getPackageName", FakeValue::Str(Some(app.into())));
        let entry = FakeObject::new("com.android.systemui.statusbar.notification.collection.NotificationEntry")
            .with_method("getSbn", FakeValue::Object(Some(sbn)));

        FakeObject::new(ROW_CLASS).with_method("getEntry", FakeValue::Object(Some(entry)))
    }

    pub fn content_view_of(row: &FakeObject) -> Self {
        FakeObject::new(CONTENT_VIEW_CLASS)
            .with_field("mContainingNotification", FakeValue::Object(Some(row.clone())))
    }

    pub fn with_hash(self, hash: i32) -> Self {
        self.0.hash.store(hash, Ordering::Relaxed);
        self
    }

    pub fn with_field(self, name: &str, value: FakeValue) -> Self {
        self.0.fields.lock().insert(name.into(), value);
        self
    }

    pub fn with_method(self, name: &str, value: FakeValue) -> Self {
        self.0.methods.lock().insert(name.into(), value);
        self
    }

    pub fn bool_field(&self, name: &str) -> Option<bool> {
        match self.0.fields.lock().get(name) {
            Some(FakeValue::Bool(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn was_called(&self, name: &str, args: &[Arg]) -> bool {
        self.0
            .calls
            .lock()
            .iter()
            .any(|(method, call_args)| method == name && call_args == args)
    }

    pub fn calls(&self, name: &str) -> usize {
        self.0.calls.lock().iter().filter(|(method, _)| method == name).count()
    }

    fn invoke(&self, method: &Member, args: &[Arg]) -> Option<FakeValue> {
        self.0.calls.lock().push((method.name.into(), args.to_vec()));
        self.0.methods.lock().get(method.name).cloned()
    }

    fn field(&self, field: &Member) -> Result<FakeValue> {
        self.0
            .fields
            .lock()
            .get(field.name)
            .cloned()
            .ok_or_else(|| anyhow!("no field {field} on {}", self.0.class))
    }
}

/// One scripted hook invocation plus the collaborators it can reach.
pub struct FakeHost {
    this: Option<FakeObject>,
    args: Vec<FakeValue>,
    result: FakeValue,
    rows: Option<Vec<ConfigRow>>,
    /// Cleared to model a process whose application context is not captured yet.
    pub ready: bool,
    pub skipped: bool,
    pub fetches: usize,
    pub settings: HashMap<String, String>,
    pub context: Option<FakeObject>,
}

impl Default for FakeHost {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeHost {
    pub fn new() -> Self {
        Self {
            this: None,
            args: Vec::new(),
            result: FakeValue::Object(None),
            rows: Some(Vec::new()),
            ready: true,
            skipped: false,
            fetches: 0,
            settings: HashMap::new(),
            context: None,
        }
    }

    pub fn with_rows(mut self, rows: Vec<ConfigRow>) -> Self {
        self.rows = Some(rows);
        self
    }

    pub fn with_this(mut self, this: FakeObject) -> Self {
        self.this = Some(this);
        self
    }

    pub fn with_args(mut self, args: Vec<FakeValue>) -> Self {
        self.args = args;
        self
    }

    pub fn with_result(mut self, result: FakeValue) -> Self {
        self.result = result;
        self
    }

    pub fn unbound(mut self) -> Self {
        self.ready = false;
        self
    }

    pub fn bool_arg(&self, index: usize) -> Option<bool> {
        match self.args.get(index) {
            Some(FakeValue::Bool(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn int_result(&self) -> Option<i32> {
        match self.result {
            FakeValue::Int(value) => Some(value),
            _ => None,
        }
    }
}

impl Reflect for FakeHost {
    type Object = FakeObject;
    type Weak = FakeWeak;

    fn call_object(&mut self, obj: &FakeObject, method: &Member) -> Result<Option<FakeObject>> {
        match obj.invoke(method, &[]) {
            Some(FakeValue::Object(value)) => Ok(value),
            Some(other) => bail!("{method} returned {other:?}"),
            None => bail!("no method {method} on {}", obj.0.class),
        }
    }

    fn call_string(&mut self, obj: &FakeObject, method: &Member) -> Result<Option<String>> {
        match obj.invoke(method, &[]) {
            Some(FakeValue::Str(value)) => Ok(value),
            Some(other) => bail!("{method} returned {other:?}"),
            None => bail!("no method {method} on {}", obj.0.class),
        }
    }

    fn call_int(&mut self, obj: &FakeObject, method: &Member) -> Result<i32> {
        match obj.invoke(method, &[]) {
            Some(FakeValue::Int(value)) => Ok(value),
            Some(other) => bail!("{method} returned {other:?}"),
            None => bail!("no method {method} on {}", obj.0.class),
        }
    }

    fn call_void(&mut self, obj: &FakeObject, method: &Member, args: &[Arg]) -> Result<()> {
        obj.invoke(method, args);
        Ok(())
    }

    fn get_object_field(&mut self, obj: &FakeObject, field: &Member) -> Result<Option<FakeObject>> {
        match obj.field(field)? {
            FakeValue::Object(value) => Ok(value),
            other => bail!("{field} holds {other:?}"),
        }
    }

    fn get_bool_field(&mut self, obj: &FakeObject, field: &Member) -> Result<bool> {
        match obj.field(field)? {
            FakeValue::Bool(value) => Ok(value),
            other => bail!("{field} holds {other:?}"),
        }
    }

    fn set_bool_field(&mut self, obj: &FakeObject, field: &Member, value: bool) -> Result<()> {
        obj.0.fields.lock().insert(field.name.into(), FakeValue::Bool(value));
        Ok(())
    }

    fn class_name(&mut self, obj: &FakeObject) -> Result<String> {
        Ok(obj.0.class.clone())
    }

    fn identity_hash(&mut self, obj: &FakeObject) -> Result<i32> {
        Ok(obj.0.hash.load(Ordering::Relaxed))
    }

    fn downgrade(&mut self, obj: &FakeObject) -> Result<FakeWeak> {
        Ok(FakeWeak(Arc::downgrade(&obj.0)))
    }

    fn upgrade(&mut self, weak: &FakeWeak) -> Option<FakeObject> {
        weak.0.upgrade().map(FakeObject)
    }

    fn refers_to(&mut self, weak: &FakeWeak, obj: &FakeObject) -> bool {
        std::ptr::eq(weak.0.as_ptr(), Arc::as_ptr(&obj.0))
    }

    fn is_collected(&mut self, weak: &FakeWeak) -> bool {
        weak.0.strong_count() == 0
    }
}

impl Invocation for FakeHost {
    fn this_object(&mut self) -> Result<FakeObject> {
        self.this.clone().context("static invocation has no receiver")
    }

    fn args(&mut self) -> Result<Vec<Option<FakeObject>>> {
        Ok(self
            .args
            .iter()
            .map(|arg| match arg {
                FakeValue::Object(value) => value.clone(),
                _ => None,
            })
            .collect())
    }

    fn arg_bool(&mut self, index: usize) -> Result<bool> {
        self.bool_arg(index).with_context(|| format!("arg {index} is not a boolean"))
    }

    fn set_arg_bool(&mut self, index: usize, value: bool) -> Result<()> {
        let slot = self.args.get_mut(index).with_context(|| format!("no arg {index}"))?;
        *slot = FakeValue::Bool(value);
        Ok(())
    }

    fn arg_touch(&mut self, index: usize) -> Result<TouchEvent> {
        match self.args.get(index) {
            Some(FakeValue::Touch(event)) => Ok(*event),
            other => bail!("arg {index} is not a touch event: {other:?}"),
        }
    }

    fn result_bool(&mut self) -> Result<bool> {
        match self.result {
            FakeValue::Bool(value) => Ok(value),
            ref other => bail!("result is not a boolean: {other:?}"),
        }
    }

    fn result_int(&mut self) -> Result<i32> {
        self.int_result().context("result is not an int")
    }

    fn set_result_int(&mut self, value: i32) -> Result<()> {
        self.result = FakeValue::Int(value);
        Ok(())
    }

    fn skip_original(&mut self) -> Result<()> {
        self.skipped = true;
        self.result = FakeValue::Object(None);
        Ok(())
    }
}

impl ConfigSource for FakeHost {
    fn fetch(&mut self) -> Result<Vec<ConfigRow>> {
        self.fetches += 1;
        self.rows.clone().context("provider unreachable")
    }

    fn is_ready(&self) -> bool {
        self.ready
    }
}

impl SettingsStore for FakeHost {
    fn put_global_string(&mut self, name: &str, value: &str) -> Result<()> {
        self.settings.insert(name.into(), value.into());
        Ok(())
    }
}

impl Host for FakeHost {
    fn bind_context(&mut self, context: &FakeObject) -> Result<()> {
        self.context = Some(context.clone());
        self.ready = true;
        Ok(())
    }
}
