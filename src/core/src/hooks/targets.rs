use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, FromRepr};

pub const SYSTEMUI_PACKAGE: &str = "com.android.systemui";

const APPLICATION: &str = "android.app.Application";
const ROW: &str = "com.android.systemui.statusbar.notification.row.ExpandableNotificationRow";
const CONTENT_VIEW: &str = "com.android.systemui.statusbar.notification.row.NotificationContentView";
const TOUCH_HELPER: &str =
    "com.oplus.systemui.notification.headsup.windowframe.OplusHeadsUpTouchHelper";
const ACTIVITY_STARTER: &str =
    "com.android.systemui.statusbar.phone.StatusBarNotificationActivityStarter";
const VIBRATION_HELPER: &str = "com.oplus.systemui.navigationbar.gesture.VibrationHelper";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Phase {
    Before,
    After,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, FromRepr)]
#[repr(u32)]
pub enum HookId {
    ApplicationCreate = 1,
    SystemExpanded,
    SystemChildExpanded,
    Expandable,
    OnKeyguard,
    VisibleType,
    IntrinsicHeight,
    PinnedHeadsUpHeight,
    HeadsUp,
    ExpandedWhenPinned,
    InterceptTouch,
    NotificationClicked,
    StartNotificationIntent,
    BackHaptic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Params {
    /// Parameter types as Java class names or primitive keywords.
    Exact(&'static [&'static str]),
    AllOverloads,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HookTarget {
    pub id: HookId,
    pub class: &'static str,
    pub method: &'static str,
    pub params: Params,
}

impl HookId {
    pub fn target(self) -> HookTarget {
        use HookId::*;

        let (class, method, params) = match self {
            ApplicationCreate => (APPLICATION, "onCreate", Params::Exact(&[])),
            SystemExpanded => (ROW, "setSystemExpanded", Params::Exact(&["boolean"])),
            SystemChildExpanded => (ROW, "setSystemChildExpanded", Params::Exact(&["boolean"])),
            Expandable => (ROW, "setExpandable", Params::Exact(&["boolean"])),
            OnKeyguard => (ROW, "setOnKeyguard", Params::Exact(&["boolean"])),
            VisibleType => (CONTENT_VIEW, "calculateVisibleType", Params::Exact(&[])),
            IntrinsicHeight => (ROW, "getIntrinsicHeight", Params::Exact(&[])),
            PinnedHeadsUpHeight => (ROW, "getPinnedHeadsUpHeight", Params::Exact(&["boolean"])),
            HeadsUp => (ROW, "setHeadsUp", Params::Exact(&["boolean"])),
            ExpandedWhenPinned => (ROW, "setExpandedWhenPinned", Params::AllOverloads),
            InterceptTouch => (
                TOUCH_HELPER,
                "onInterceptTouchEvent",
                Params::Exact(&["android.view.MotionEvent"]),
            ),
            NotificationClicked => (ACTIVITY_STARTER, "onNotificationClicked", Params::AllOverloads),
            StartNotificationIntent => {
                (ACTIVITY_STARTER, "startNotificationIntent", Params::AllOverloads)
            }
            BackHaptic => (
                VIBRATION_HELPER,
                "doVibrateCustomized",
                Params::Exact(&["android.content.Context", "int", "boolean"]),
            ),
        };

        HookTarget {
            id: self,
            class,
            method,
            params,
        }
    }
}

pub fn targets() -> impl Iterator<Item = HookTarget> {
    HookId::iter().map(HookId::target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn ids_round_trip_through_repr() {
        for id in HookId::iter() {
            assert_eq!(HookId::from_repr(id as u32), Some(id));
        }
        assert_eq!(HookId::from_repr(0), None);
    }

    #[test]
    fn every_target_is_unique() {
        let mut seen = HashSet::new();

        for target in targets() {
            assert!(!target.class.contains('/'), "{} uses a binary name", target.class);
            assert!(seen.insert((target.class, target.method)), "{:?} listed twice", target.id);
        }
    }
}
