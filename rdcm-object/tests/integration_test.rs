use rdcm_core::Tag;
use rdcm_dictionary_std::uids;
use rdcm_object::{DicomFile, FileMetaTable, InMemDicomObject};

/// A pixel sequence fragment carries its own explicit length, so a
/// single encapsulated fragment round-trips through a file even
/// though the Pixel Data element itself has undefined length.
#[test]
fn pixel_sequence_fragment_round_trips_through_a_file() {
    let ts = rdcm_transfer_syntax_registry::get(uids::JPEG_2000_LOSSLESS)
        .expect("JPEG 2000 Lossless is always registered");

    let mut dataset = InMemDicomObject::new_empty(ts);
    let fragment = {
        let mut bytes = vec![0xFFu8, 0x4Fu8];
        bytes.extend(std::iter::repeat(0u8).take(60));
        bytes.extend([0xFFu8, 0xD9u8]);
        bytes
    };
    dataset.put_pixel_sequence(vec![fragment.clone()], vec![0]);

    let meta = FileMetaTable::new(
        uids::SECONDARY_CAPTURE_IMAGE_STORAGE.to_string(),
        "1.2.3.4.5".to_string(),
        ts.uid.to_string(),
    );
    let file = DicomFile::new(meta, dataset);

    let dir = tempfile::tempdir().expect("could not create temp dir");
    let path = dir.path().join("fragment.dcm");
    file.write_to_file(&path).expect("could not write file");

    let read_back = DicomFile::open(&path).expect("could not open file");
    let element = read_back
        .dataset()
        .get(Tag::PIXEL_DATA)
        .expect("missing PixelData element");

    match element.value() {
        rdcm_core::Value::PixelSequence { fragments, .. } => {
            assert_eq!(fragments.len(), 1);
            let fragment = &fragments[0];
            assert_eq!(&fragment[0..2], &[0xFF, 0x4F]);
            assert_eq!(&fragment[fragment.len() - 2..], &[0xFF, 0xD9]);
        }
        other => panic!("expected a pixel sequence, got {:?}", other),
    }
}
