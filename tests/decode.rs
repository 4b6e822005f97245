//! Decoder tests over synthetic link files built byte-by-byte in memory.

#[allow(unused)]
use log::{debug, trace};

use lnkspect::extradata::{BlockPayload, BlockTypes};
use lnkspect::linkinfo::DriveType;
use lnkspect::propertystore::{NameType, PropVariant, PropertyName, STORE_VERSION};
use lnkspect::{
    validate, Error, FileAttributeFlags, LinkFlags, ShellLinkFile, ValidationFailure,
};

/// Packet representation of the shell link CLSID
/// `{00021401-0000-0000-C000-000000000046}`.
const CLSID_BYTES: [u8; 16] = [
    0x01, 0x14, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0xc0, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x46,
];

fn header_bytes(flags: u32) -> Vec<u8> {
    let mut data = vec![0u8; 0x4c];
    data[0] = 0x4c;
    data[4..20].copy_from_slice(&CLSID_BYTES);
    data[20..24].copy_from_slice(&flags.to_le_bytes());
    data[60] = 0x01; // ShowNormal
    data
}

fn utf16_bytes(s: &str) -> Vec<u8> {
    s.encode_utf16().flat_map(|u| u.to_le_bytes()).collect()
}

#[test]
fn s1_minimum_valid_file() {
    let _ = pretty_env_logger::try_init();

    let data = header_bytes(0);
    assert!(validate(&data).is_ok(), "a bare header must validate");

    let link = ShellLinkFile::parse(&data).unwrap();
    assert!(link.header().link_flags().is_empty(), "no flags were set");
    assert_eq!(
        *link.header().file_attributes(),
        FileAttributeFlags::empty()
    );
    assert!(link.link_target_id_list().is_none());
    assert!(link.link_info().is_none());
    assert!(link.name().is_none());
    assert!(link.extra_data().blocks().is_empty());

    assert_eq!(link.header().creation_time().format_short(), "[UNSET]");
    assert_eq!(link.header().access_time().format_long(), "[UNSET]");
    assert_eq!(link.header().write_time().format_short(), "[UNSET]");
    assert_eq!(link.file_size(), 0x4c);
}

#[test]
fn s2_wrong_header_size_is_not_a_shortcut() {
    let mut data = header_bytes(0);
    data[0] = 0x50;
    assert_eq!(validate(&data), Err(ValidationFailure::HeaderSize));
    match ShellLinkFile::parse(&data) {
        Err(Error::NotAShellLink(ValidationFailure::HeaderSize)) => {}
        other => panic!("expected NotAShellLink(HeaderSize), got {other:?}"),
    }
}

#[test]
fn validator_reports_the_first_failing_check() {
    assert_eq!(
        validate(&[0u8; 10]),
        Err(ValidationFailure::FileTooSmall),
        "short input fails the length check first"
    );

    let mut bad_clsid = header_bytes(0);
    bad_clsid[4] = 0xff;
    assert_eq!(validate(&bad_clsid), Err(ValidationFailure::ClassId));

    let mut bad_reserved1 = header_bytes(0);
    bad_reserved1[66] = 1;
    assert_eq!(validate(&bad_reserved1), Err(ValidationFailure::Reserved1));

    let mut bad_reserved2 = header_bytes(0);
    bad_reserved2[68] = 1;
    assert_eq!(validate(&bad_reserved2), Err(ValidationFailure::Reserved2));

    let mut bad_reserved3 = header_bytes(0);
    bad_reserved3[75] = 1;
    assert_eq!(validate(&bad_reserved3), Err(ValidationFailure::Reserved3));
}

#[test]
fn s3_unicode_name_string() {
    let flags = LinkFlags::HAS_NAME | LinkFlags::IS_UNICODE;
    let mut data = header_bytes(flags.bits());
    data.extend_from_slice(&5u16.to_le_bytes());
    data.extend_from_slice(&utf16_bytes("Hello"));

    let link = ShellLinkFile::parse(&data).unwrap();
    assert_eq!(link.name(), Some("Hello"));
    let name = link.string_data().name_string().as_ref().unwrap();
    assert_eq!(name.char_count(), 5);
    assert!(link.relative_path().is_none());
}

#[test]
fn hotkey_pair_decodes() {
    let mut data = header_bytes(0);
    data[64] = 0x4b; // 'K'
    data[65] = 0x06; // CTRL + ALT
    let link = ShellLinkFile::parse(&data).unwrap();
    assert_eq!(link.header().hotkey().describe(), "CTRL+ALT+K");
}

fn legacy_linkinfo() -> Vec<u8> {
    let label = b"DATA\0";
    let lbp = b"C:\\tmp\0";
    let vol_off = 0x1cusize;
    let vol_size = 16 + label.len();
    let lbp_off = vol_off + vol_size;
    let cps_off = lbp_off + lbp.len();
    let total = cps_off + 1;

    let mut li = Vec::new();
    li.extend_from_slice(&(total as u32).to_le_bytes());
    li.extend_from_slice(&0x1cu32.to_le_bytes()); // legacy header size
    li.extend_from_slice(&1u32.to_le_bytes()); // VolumeIDAndLocalBasePath
    li.extend_from_slice(&(vol_off as u32).to_le_bytes());
    li.extend_from_slice(&(lbp_off as u32).to_le_bytes());
    li.extend_from_slice(&0u32.to_le_bytes());
    li.extend_from_slice(&(cps_off as u32).to_le_bytes());
    // VolumeID, code-page label
    li.extend_from_slice(&(vol_size as u32).to_le_bytes());
    li.extend_from_slice(&3u32.to_le_bytes()); // fixed drive
    li.extend_from_slice(&0x1234_5678u32.to_le_bytes());
    li.extend_from_slice(&0x10u32.to_le_bytes());
    li.extend_from_slice(label);
    li.extend_from_slice(lbp);
    li.push(0); // empty common path suffix
    assert_eq!(li.len(), total);
    li
}

fn unicode_linkinfo() -> Vec<u8> {
    let label = utf16_bytes("DATA\0");
    let lbp = b"C:\\tmp\0";
    let vol_off = 0x24usize;
    let vol_size = 20 + label.len();
    let lbp_off = vol_off + vol_size;
    let cps_off = lbp_off + lbp.len();
    let total = cps_off + 1;

    let mut li = Vec::new();
    li.extend_from_slice(&(total as u32).to_le_bytes());
    li.extend_from_slice(&0x24u32.to_le_bytes()); // extended header size
    li.extend_from_slice(&1u32.to_le_bytes());
    li.extend_from_slice(&(vol_off as u32).to_le_bytes());
    li.extend_from_slice(&(lbp_off as u32).to_le_bytes());
    li.extend_from_slice(&0u32.to_le_bytes());
    li.extend_from_slice(&(cps_off as u32).to_le_bytes());
    li.extend_from_slice(&0u32.to_le_bytes()); // no unicode base path
    li.extend_from_slice(&0u32.to_le_bytes()); // no unicode suffix
    // VolumeID, UTF-16 label behind the unicode offset
    li.extend_from_slice(&(vol_size as u32).to_le_bytes());
    li.extend_from_slice(&3u32.to_le_bytes());
    li.extend_from_slice(&0x1234_5678u32.to_le_bytes());
    li.extend_from_slice(&0x14u32.to_le_bytes());
    li.extend_from_slice(&0x14u32.to_le_bytes());
    li.extend_from_slice(&label);
    li.extend_from_slice(lbp);
    li.push(0);
    assert_eq!(li.len(), total);
    li
}

#[test]
fn s4_volume_label_legacy_and_unicode() {
    for (linkinfo, label_is_unicode) in [(legacy_linkinfo(), false), (unicode_linkinfo(), true)] {
        let mut data = header_bytes(LinkFlags::HAS_LINK_INFO.bits());
        let linkinfo_len = linkinfo.len() as u64;
        data.extend_from_slice(&linkinfo);

        let link = ShellLinkFile::parse(&data).unwrap();
        let info = link.link_info().unwrap();
        let vol = info.volume_id().as_ref().unwrap();

        assert_eq!(vol.volume_label(), "DATA");
        assert_eq!(
            vol.volume_label_offset_unicode().is_some(),
            label_is_unicode,
            "the unicode offset field exists iff the extended header layout is used"
        );
        assert_eq!(*vol.drive_type(), DriveType::DriveFixed);
        assert_eq!(*vol.drive_serial_number(), 0x1234_5678);
        assert_eq!(info.local_base_path(), Some("C:\\tmp"));
        assert_eq!(info.common_path_suffix(), Some(""));
        assert_eq!(*info.link_info_size() as u64, linkinfo_len);
        // The regions account for the whole input.
        assert_eq!(0x4c + linkinfo_len, link.file_size());
    }
}

#[test]
fn truncated_linkinfo_reports_its_offset() {
    let mut data = header_bytes(LinkFlags::HAS_LINK_INFO.bits());
    data.extend_from_slice(&0x50u32.to_le_bytes()); // declares more than remains
    match ShellLinkFile::parse(&data) {
        Err(Error::Truncated { offset }) => assert_eq!(offset, 0x4c),
        other => panic!("expected Truncated at the LinkInfo start, got {other:?}"),
    }
}

/// Ticks since 1582-10-15 for 2010-01-01 00:00:00 UTC.
const V1_TICKS_2010: u64 = 134_815_968_000_000_000;

fn v1_uuid_packet(ticks: u64, clock_seq: u16, node: [u8; 6]) -> [u8; 16] {
    let mut out = [0u8; 16];
    out[0..4].copy_from_slice(&(ticks as u32).to_le_bytes());
    out[4..6].copy_from_slice(&((ticks >> 32) as u16).to_le_bytes());
    out[6..8].copy_from_slice(&(((ticks >> 48) as u16 & 0x0fff) | 0x1000).to_le_bytes());
    out[8] = 0x80 | ((clock_seq >> 8) as u8 & 0x3f);
    out[9] = clock_seq as u8;
    out[10..16].copy_from_slice(&node);
    out
}

#[test]
fn s5_tracker_block_derives_droid_forensics() {
    let droid = v1_uuid_packet(V1_TICKS_2010, 0x1357, [0x00, 0x11, 0x22, 0x33, 0x44, 0x55]);

    let mut block = Vec::new();
    block.extend_from_slice(&0x60u32.to_le_bytes());
    block.extend_from_slice(&0xa000_0003u32.to_le_bytes());
    block.extend_from_slice(&0x58u32.to_le_bytes()); // length
    block.extend_from_slice(&0u32.to_le_bytes()); // version
    let mut machine = [0u8; 16];
    machine[..6].copy_from_slice(b"pc-lab");
    block.extend_from_slice(&machine);
    for _ in 0..4 {
        block.extend_from_slice(&droid);
    }
    assert_eq!(block.len(), 0x60);

    let mut data = header_bytes(0);
    data.extend_from_slice(&block);
    data.extend_from_slice(&0u32.to_le_bytes()); // terminal

    let link = ShellLinkFile::parse(&data).unwrap();
    let extra = link.extra_data();
    assert!(extra.observed().contains(BlockTypes::TRACKER));
    assert_eq!(*extra.terminal(), 0);
    assert_eq!(*extra.size(), 0x60 + 4);
    assert_eq!(0x4c + extra.size(), link.file_size());

    let tracker = extra.tracker().expect("the tracker block must decode");
    assert_eq!(*tracker.length(), 0x58);
    assert_eq!(tracker.machine_id(), "pc-lab");

    let detail = tracker.droid()[0].describe();
    assert_eq!(detail.version, "1 - time based");
    assert_eq!(
        detail.time.unwrap().format_short(),
        "2010-01-01 00:00:00 (UTC)",
        "the droid timestamp must re-anchor onto the FILETIME epoch"
    );
    assert_eq!(detail.clock_sequence, Some(0x1357));
    assert_eq!(detail.node.as_deref(), Some("00:11:22:33:44:55"));
}

/// {D5CDD505-2E9C-101B-9397-08002B2CF9AE} in packet representation.
const STRING_NAMES_FMTID_BYTES: [u8; 16] = [
    0x05, 0xd5, 0xcd, 0xd5, 0x9c, 0x2e, 0x1b, 0x10, 0x93, 0x97, 0x08, 0x00, 0x2b, 0x2c, 0xf9,
    0xae,
];

fn string_name_store(name: &str, text: &str) -> Vec<u8> {
    let name_bytes = utf16_bytes(&format!("{name}\0"));
    let text_units = text.encode_utf16().count() + 1;
    let text_bytes = utf16_bytes(&format!("{text}\0"));

    let value_size = 4 + 4 + 1 + name_bytes.len() + 2 + 2 + 4 + text_bytes.len();
    let mut value = Vec::new();
    value.extend_from_slice(&(value_size as u32).to_le_bytes());
    value.extend_from_slice(&(name_bytes.len() as u32).to_le_bytes());
    value.push(0); // reserved
    value.extend_from_slice(&name_bytes);
    value.extend_from_slice(&0x1fu16.to_le_bytes()); // VT_LPWSTR
    value.extend_from_slice(&0u16.to_le_bytes());
    value.extend_from_slice(&(text_units as u32).to_le_bytes());
    value.extend_from_slice(&text_bytes);

    let storage_size = 4 + 4 + 16 + value.len() + 4;
    let mut store = Vec::new();
    store.extend_from_slice(&(storage_size as u32).to_le_bytes());
    store.extend_from_slice(&STORE_VERSION.to_le_bytes());
    store.extend_from_slice(&STRING_NAMES_FMTID_BYTES);
    store.extend_from_slice(&value);
    store.extend_from_slice(&0u32.to_le_bytes()); // value terminator
    store
}

#[test]
fn s6_property_store_block_with_string_name() {
    let store = string_name_store("Title", "Demo");
    let block_size = 8 + store.len() + 4;

    let mut data = header_bytes(0);
    data.extend_from_slice(&(block_size as u32).to_le_bytes());
    data.extend_from_slice(&0xa000_0009u32.to_le_bytes());
    data.extend_from_slice(&store);
    data.extend_from_slice(&0u32.to_le_bytes()); // store series terminator
    data.extend_from_slice(&0u32.to_le_bytes()); // chain terminal

    let link = ShellLinkFile::parse(&data).unwrap();
    let extra = link.extra_data();
    assert!(extra.observed().contains(BlockTypes::PROPERTY_STORE));

    let block = extra.property_store().expect("the store block must decode");
    assert_eq!(block.stores().len(), 1);
    let store = &block.stores()[0];
    assert_eq!(*store.position(), 0x4c + 8);
    assert_eq!(*store.name_type(), NameType::StringName);
    assert_eq!(store.values().len(), 1);
    let value = &store.values()[0];
    assert_eq!(*value.name(), PropertyName::Name("Title".to_string()));
    match value.value() {
        PropVariant::Lpwstr(text) => assert_eq!(text, "Demo"),
        other => panic!("expected VT_LPWSTR, got {other:?}"),
    }
}

#[test]
fn embedded_stores_are_found_inside_item_id_payloads() {
    let store = string_name_store("Author", "nobody");
    let mut payload = vec![0xeeu8; 6]; // opaque shell prefix
    let store_offset_in_payload = payload.len() as u64;
    payload.extend_from_slice(&store);
    payload.extend_from_slice(&0u32.to_le_bytes());

    let item_size = (payload.len() + 2) as u16;
    let id_list_size = item_size + 2;

    let mut data = header_bytes(LinkFlags::HAS_LINK_TARGET_ID_LIST.bits());
    data.extend_from_slice(&id_list_size.to_le_bytes());
    data.extend_from_slice(&item_size.to_le_bytes());
    data.extend_from_slice(&payload);
    data.extend_from_slice(&0u16.to_le_bytes()); // terminal ID

    let link = ShellLinkFile::parse(&data).unwrap();
    let list = link.link_target_id_list().unwrap();
    assert_eq!(list.id_list().len(), 1);

    let stores = link.embedded_property_stores();
    assert_eq!(stores.len(), 1);
    // Size field (0x4c) + IDList size field (2) + ItemID size field (2).
    let payload_base = 0x4c + 2 + 2;
    assert_eq!(*stores[0].position(), payload_base + store_offset_in_payload);
    assert_eq!(
        *stores[0].values()[0].name(),
        PropertyName::Name("Author".to_string())
    );
}

#[test]
fn unknown_extra_data_blocks_are_skipped_not_fatal() {
    let mut data = header_bytes(0);
    data.extend_from_slice(&16u32.to_le_bytes());
    data.extend_from_slice(&0xa000_00ffu32.to_le_bytes());
    data.extend_from_slice(&[0xab; 8]);
    data.extend_from_slice(&0u32.to_le_bytes());

    let link = ShellLinkFile::parse(&data).unwrap();
    let extra = link.extra_data();
    assert!(extra.observed().contains(BlockTypes::UNKNOWN));
    assert_eq!(extra.blocks().len(), 1);
    match extra.blocks()[0].payload() {
        BlockPayload::Unknown(raw) => assert_eq!(raw.len(), 8),
        other => panic!("expected a raw payload, got {other:?}"),
    }
}

#[test]
fn oversized_extra_data_block_is_rejected() {
    let mut data = header_bytes(0);
    data.extend_from_slice(&5000u32.to_le_bytes());
    data.extend_from_slice(&0xa000_0003u32.to_le_bytes());
    match ShellLinkFile::parse(&data) {
        Err(Error::OversizedBlock { offset, size }) => {
            assert_eq!(offset, 0x4c);
            assert_eq!(size, 5000);
        }
        other => panic!("expected OversizedBlock, got {other:?}"),
    }
}

#[test]
fn string_data_in_codepage_mode_counts_bytes() {
    let flags = LinkFlags::HAS_NAME | LinkFlags::HAS_WORKING_DIR;
    let mut data = header_bytes(flags.bits());
    data.extend_from_slice(&4u16.to_le_bytes());
    data.extend_from_slice(b"desc");
    data.extend_from_slice(&6u16.to_le_bytes());
    data.extend_from_slice(b"C:\\dir");

    let link = ShellLinkFile::parse(&data).unwrap();
    assert_eq!(link.name(), Some("desc"));
    assert_eq!(link.working_dir(), Some("C:\\dir"));
    assert_eq!(
        link.string_data().byte_len(flags),
        (2 + 4) + (2 + 6),
        "code-page entries are one byte per unit"
    );
}
