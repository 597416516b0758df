//! Categorization of SOP class UIDs, used by the association engine to
//! decide how an accepted presentation context's role should behave
//! (grounded on `dictionary-std/src/sop_class.rs`'s category functions,
//! reduced to the categories the DIMSE services care about).

use crate::uids;

/// Whether a SOP class UID names a Storage SOP class (the kind C-STORE
/// and C-GET/C-MOVE sub-operations transfer).
pub fn is_storage(sop_class_uid: &str) -> bool {
    matches!(
        sop_class_uid,
        uids::CT_IMAGE_STORAGE
            | uids::MR_IMAGE_STORAGE
            | uids::SECONDARY_CAPTURE_IMAGE_STORAGE
            | uids::ULTRASOUND_IMAGE_STORAGE
    )
}

/// Whether a SOP class UID names a Query/Retrieve FIND model.
pub fn is_find(sop_class_uid: &str) -> bool {
    uids::QR_FIND_SOP_CLASSES.contains(&sop_class_uid)
}

/// Whether a SOP class UID names a Query/Retrieve GET model.
pub fn is_get(sop_class_uid: &str) -> bool {
    uids::QR_GET_SOP_CLASSES.contains(&sop_class_uid)
}

/// Whether a SOP class UID names a Query/Retrieve MOVE model.
pub fn is_move(sop_class_uid: &str) -> bool {
    uids::QR_MOVE_SOP_CLASSES.contains(&sop_class_uid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categorizes_storage_and_retrieve() {
        assert!(is_storage(uids::CT_IMAGE_STORAGE));
        assert!(is_get(uids::STUDY_ROOT_QR_GET));
        assert!(!is_storage(uids::STUDY_ROOT_QR_GET));
    }
}
