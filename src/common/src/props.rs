use std::ops::Deref;

#[cfg(target_os = "android")]
mod system {
    pub const PROP_VALUE_MAX: usize = 92;

    use std::ffi::c_char;

    unsafe extern "C" {
        pub fn __system_property_get(name: *const c_char, value: *mut c_char) -> u32;
    }
}

// https://cs.android.com/android/platform/superproject/main/+/main:system/libbase/parsebool.cpp;l=23-31;drc=61197364367c9e404c7da6900658f1b16c42d0da
fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "y" | "yes" | "on" | "true" => Some(true),
        "0" | "n" | "no" | "off" | "false" => Some(false),
        _ => None,
    }
}

pub struct Property(String);

impl From<Property> for bool {
    fn from(value: Property) -> Self {
        parse_bool(&value).unwrap_or_default()
    }
}

impl Property {
    pub fn as_bool(&self) -> Option<bool> {
        parse_bool(self)
    }
}

impl Deref for Property {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

#[cfg(target_os = "android")]
pub fn get(name: &str) -> Option<Property> {
    use std::ffi::{CStr, CString};

    let name = CString::new(name).ok()?;
    let mut buffer = [0u8; system::PROP_VALUE_MAX + 1];

    let len = unsafe { system::__system_property_get(name.as_ptr(), buffer.as_mut_ptr() as _) };

    if len == 0 {
        return None;
    }

    let value = CStr::from_bytes_until_nul(&buffer).ok()?;
    Some(Property(value.to_string_lossy().into_owned()))
}

/// Off-device builds have no property service; every lookup misses.
#[cfg(not(target_os = "android"))]
pub fn get(_name: &str) -> Option<Property> {
    None
}

pub fn prop_on(name: &str) -> bool {
    get(name).map(|it| it.into()).unwrap_or_default()
}

/// `debug_on!("hooks")` is true when `debug.autoexpand.hooks` is set; release builds never look.
#[macro_export]
macro_rules! debug_on {
    ($key: literal) => {
        cfg!(debug_assertions) && $crate::props::prop_on(concat!("debug.autoexpand.", $key))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bool_spellings_follow_libbase() {
        assert_eq!(Property("on".into()).as_bool(), Some(true));
        assert_eq!(Property("0".into()).as_bool(), Some(false));
        assert_eq!(Property("maybe".into()).as_bool(), None);
        assert!(!bool::from(Property(String::new())));
    }

    #[test]
    fn debug_switches_are_off_without_property_service() {
        assert!(!debug_on!("hooks"));
    }
}
