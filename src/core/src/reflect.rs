use crate::config::ConfigSource;
use crate::gesture::TouchEvent;
use anyhow::Result;
use std::fmt::{Display, Formatter};

/// A field or method on a host type, addressed by name and JNI signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Member {
    pub name: &'static str,
    pub sig: &'static str,
}

impl Member {
    pub const fn new(name: &'static str, sig: &'static str) -> Self {
        Self { name, sig }
    }
}

impl Display for Member {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.name, self.sig)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Arg {
    Bool(bool),
    Int(i32),
}

/// Reflective access to objects owned by the host process.
///
/// Objects are borrowed for the duration of one hook invocation. `Weak`
/// handles may outlive it and never keep the object alive.
pub trait Reflect {
    type Object;
    type Weak: Clone + Send + Sync + 'static;

    fn call_object(&mut self, obj: &Self::Object, method: &Member) -> Result<Option<Self::Object>>;
    fn call_string(&mut self, obj: &Self::Object, method: &Member) -> Result<Option<String>>;
    fn call_int(&mut self, obj: &Self::Object, method: &Member) -> Result<i32>;
    fn call_void(&mut self, obj: &Self::Object, method: &Member, args: &[Arg]) -> Result<()>;

    fn get_object_field(&mut self, obj: &Self::Object, field: &Member) -> Result<Option<Self::Object>>;
    fn get_bool_field(&mut self, obj: &Self::Object, field: &Member) -> Result<bool>;
    fn set_bool_field(&mut self, obj: &Self::Object, field: &Member, value: bool) -> Result<()>;

    fn class_name(&mut self, obj: &Self::Object) -> Result<String>;
    fn identity_hash(&mut self, obj: &Self::Object) -> Result<i32>;

    fn downgrade(&mut self, obj: &Self::Object) -> Result<Self::Weak>;
    fn upgrade(&mut self, weak: &Self::Weak) -> Option<Self::Object>;
    fn refers_to(&mut self, weak: &Self::Weak, obj: &Self::Object) -> bool;
    fn is_collected(&mut self, weak: &Self::Weak) -> bool;
}

/// The intercepted call currently in flight.
pub trait Invocation: Reflect {
    fn this_object(&mut self) -> Result<Self::Object>;
    fn args(&mut self) -> Result<Vec<Option<Self::Object>>>;

    fn arg_bool(&mut self, index: usize) -> Result<bool>;
    fn set_arg_bool(&mut self, index: usize, value: bool) -> Result<()>;
    fn arg_touch(&mut self, index: usize) -> Result<TouchEvent>;

    fn result_bool(&mut self) -> Result<bool>;
    fn result_int(&mut self) -> Result<i32>;
    fn set_result_int(&mut self, value: i32) -> Result<()>;

    /// Skip the original method; it returns null/void to its caller.
    fn skip_original(&mut self) -> Result<()>;
}

pub trait SettingsStore {
    fn put_global_string(&mut self, name: &str, value: &str) -> Result<()>;
}

/// Everything a hook body may touch while the host is blocked on it.
pub trait Host: Invocation + ConfigSource + SettingsStore {
    /// Remember the host application object for later configuration queries.
    fn bind_context(&mut self, context: &Self::Object) -> Result<()>;
}

pub mod members {
    use super::Member;

    const ROW_SIG: &str = "Lcom/android/systemui/statusbar/notification/row/ExpandableNotificationRow;";

    pub const GET_ENTRY: Member = Member::new(
        "getEntry",
        "()Lcom/android/systemui/statusbar/notification/collection/NotificationEntry;",
    );
    pub const GET_SBN: Member =
        Member::new("getSbn", "()Landroid/service/notification/StatusBarNotification;");
    pub const GET_PACKAGE_NAME: Member = Member::new("getPackageName", "()Ljava/lang/String;");
    pub const GET_ROW: Member = Member::new(
        "getRow",
        "()Lcom/android/systemui/statusbar/notification/row/ExpandableNotificationRow;",
    );

    pub const CONTAINING_NOTIFICATION: Member = Member::new("mContainingNotification", ROW_SIG);
    pub const PRIVATE_LAYOUT: Member = Member::new(
        "mPrivateLayout",
        "Lcom/android/systemui/statusbar/notification/row/NotificationContentView;",
    );
    pub const EXPANDED_CHILD: Member = Member::new("mExpandedChild", "Landroid/view/View;");
    pub const IS_HEADS_UP: Member = Member::new("mIsHeadsUp", "Z");
    pub const EXPANDED_WHEN_PINNED: Member = Member::new("mExpandedWhenPinned", "Z");

    pub const GET_INTRINSIC_HEIGHT: Member = Member::new("getIntrinsicHeight", "()I");
    pub const GET_MAX_EXPAND_HEIGHT: Member = Member::new("getMaxExpandHeight", "()I");
    pub const SET_ACTUAL_HEIGHT: Member = Member::new("setActualHeight", "(I)V");
    pub const NOTIFY_HEIGHT_CHANGED: Member = Member::new("notifyHeightChanged", "(Z)V");

    pub const GET_MEASURED_HEIGHT: Member = Member::new("getMeasuredHeight", "()I");
    pub const REQUEST_LAYOUT: Member = Member::new("requestLayout", "()V");
    pub const GET_PARENT: Member = Member::new("getParent", "()Landroid/view/ViewParent;");

    pub const GET_TOUCHING_HEADS_UP_VIEW: Member = Member::new(
        "getMTouchingHeadsUpView",
        "()Lcom/android/systemui/statusbar/notification/row/ExpandableNotificationRow;",
    );
}
