use crate::reflect::Reflect;
use crate::reflect::members::{CONTAINING_NOTIFICATION, GET_ENTRY, GET_PACKAGE_NAME, GET_SBN};
use anyhow::Result;
use autoexpand_common::ext::ResultExt;

fn resolve<R: Reflect + ?Sized>(rt: &mut R, row: &R::Object) -> Result<Option<String>> {
    let Some(entry) = rt.call_object(row, &GET_ENTRY)? else {
        return Ok(None);
    };

    let Some(sbn) = rt.call_object(&entry, &GET_SBN)? else {
        return Ok(None);
    };

    rt.call_string(&sbn, &GET_PACKAGE_NAME)
}

/// Package name of the app that posted the notification shown by `row`.
///
/// `None` means unknown; a missing link is not a fault.
pub fn identity_of<R: Reflect + ?Sized>(rt: &mut R, row: &R::Object) -> Option<String> {
    resolve(rt, row).ok_or_debug().flatten()
}

pub fn identity_of_content_view<R: Reflect + ?Sized>(rt: &mut R, view: &R::Object) -> Option<String> {
    let row = rt
        .get_object_field(view, &CONTAINING_NOTIFICATION)
        .ok_or_debug()
        .flatten()?;

    identity_of(rt, &row)
}
