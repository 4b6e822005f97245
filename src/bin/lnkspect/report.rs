//! The hierarchical text report: one record per file, sections labelled
//! with their [MS-SHLLINK] section numbers.

use std::io::{self, Write};
use std::path::Path;

use lnkspect::extradata::{BlockPayload, ExtraDataBlock};
use lnkspect::propertystore::{PropVariant, SerializedPropertyStore};
use lnkspect::{Guid, LinkInfo, ShellLinkFile, SizedString};

use crate::table::flag_names;

pub struct Options {
    pub short: bool,
    pub idlist_stores: bool,
}

pub fn write_report<W: Write>(
    w: &mut W,
    path: &Path,
    link: &ShellLinkFile,
    opts: &Options,
) -> io::Result<()> {
    writeln!(w, "{}", "-".repeat(78))?;
    writeln!(w, "File: {}", path.display())?;

    write_header(w, link, opts)?;
    write_idlist(w, link, opts)?;
    if let Some(info) = link.link_info() {
        write_linkinfo(w, info, opts)?;
    }
    write_stringdata(w, link)?;
    write_extradata(w, link, opts)?;
    writeln!(w)
}

fn kv<W: Write>(w: &mut W, indent: usize, key: &str, value: impl AsRef<str>) -> io::Result<()> {
    writeln!(w, "{:indent$}{}: {}", "", key, value.as_ref(), indent = indent)
}

fn opt(value: Option<&str>) -> &str {
    value.unwrap_or("[NOT SET]")
}

fn write_header<W: Write>(w: &mut W, link: &ShellLinkFile, opts: &Options) -> io::Result<()> {
    let header = link.header();
    writeln!(w, "  {{S_2.1 - ShellLinkHeader}}")?;
    if !opts.short {
        kv(w, 4, "HeaderSize", format!("{} bytes", header.header_size()))?;
        kv(w, 4, "LinkCLSID", header.link_clsid().braced())?;
        kv(
            w,
            4,
            "LinkFlags",
            format!("0x{:08X}", header.link_flags().bits()),
        )?;
    }
    kv(w, 4, "LinkFlags (decoded)", flag_names(header.link_flags()))?;
    if !opts.short {
        kv(
            w,
            4,
            "FileAttributes",
            format!("0x{:08X}", header.file_attributes().bits()),
        )?;
    }
    kv(
        w,
        4,
        "FileAttributes (decoded)",
        flag_names(header.file_attributes()),
    )?;
    let (create, access, write_time) = if opts.short {
        (
            header.creation_time().format_short(),
            header.access_time().format_short(),
            header.write_time().format_short(),
        )
    } else {
        (
            header.creation_time().format_long(),
            header.access_time().format_long(),
            header.write_time().format_long(),
        )
    };
    kv(w, 4, "CreationTime", create)?;
    kv(w, 4, "AccessTime", access)?;
    kv(w, 4, "WriteTime", write_time)?;
    kv(w, 4, "FileSize", format!("{} bytes", header.file_size()))?;
    kv(w, 4, "IconIndex", header.icon_index().to_string())?;
    kv(w, 4, "ShowCommand", format!("{:?}", header.show_command()))?;
    kv(w, 4, "HotKeys", header.hotkey().describe())?;
    if !opts.short {
        kv(w, 4, "Reserved1", header.reserved1().to_string())?;
        kv(w, 4, "Reserved2", header.reserved2().to_string())?;
        kv(w, 4, "Reserved3", header.reserved3().to_string())?;
    }
    Ok(())
}

fn write_idlist<W: Write>(w: &mut W, link: &ShellLinkFile, opts: &Options) -> io::Result<()> {
    let Some(list) = link.link_target_id_list() else {
        return Ok(());
    };
    writeln!(w, "  {{S_2.2 - LinkTargetIDList}}")?;
    if !opts.short {
        kv(w, 4, "IDListSize", format!("{} bytes", list.size()))?;
    }
    kv(w, 4, "NumItemIDs", list.id_list().len().to_string())?;
    if !opts.short {
        for (i, item) in list.id_list().iter().enumerate() {
            kv(
                w,
                4,
                &format!("ItemID[{i}]"),
                format!("offset 0x{:x}, {} bytes", item.offset(), item.size()),
            )?;
        }
    }
    if opts.idlist_stores {
        let stores = link.embedded_property_stores();
        kv(w, 4, "EmbeddedPropertyStores", stores.len().to_string())?;
        for store in &stores {
            write_store(w, 4, store, opts)?;
        }
    }
    Ok(())
}

fn write_linkinfo<W: Write>(w: &mut W, info: &LinkInfo, opts: &Options) -> io::Result<()> {
    writeln!(w, "  {{S_2.3 - LinkInfo}}")?;
    if !opts.short {
        kv(w, 4, "LinkInfoSize", format!("{} bytes", info.link_info_size()))?;
        kv(
            w,
            4,
            "LinkInfoHeaderSize",
            format!("{} bytes", info.link_info_header_size()),
        )?;
        kv(
            w,
            4,
            "LinkInfoFlags",
            format!("0x{:08X}", info.link_info_flags().bits()),
        )?;
        kv(w, 4, "VolumeIDOffset", format!("0x{:x}", info.volume_id_offset()))?;
        kv(
            w,
            4,
            "LocalBasePathOffset",
            format!("0x{:x}", info.local_base_path_offset()),
        )?;
        kv(
            w,
            4,
            "CommonNetworkRelativeLinkOffset",
            format!("0x{:x}", info.common_network_relative_link_offset()),
        )?;
        kv(
            w,
            4,
            "CommonPathSuffixOffset",
            format!("0x{:x}", info.common_path_suffix_offset()),
        )?;
        if let Some(offset) = info.local_base_path_offset_unicode() {
            kv(w, 4, "LocalBasePathOffsetUnicode", format!("0x{offset:x}"))?;
        }
        if let Some(offset) = info.common_path_suffix_offset_unicode() {
            kv(w, 4, "CommonPathSuffixOffsetUnicode", format!("0x{offset:x}"))?;
        }
    }
    kv(
        w,
        4,
        "LinkInfoFlags (decoded)",
        flag_names(info.link_info_flags()),
    )?;

    if let Some(vol) = info.volume_id() {
        writeln!(w, "    {{S_2.3.1 - VolumeID}}")?;
        if !opts.short {
            kv(w, 6, "VolumeIDSize", format!("{} bytes", vol.volume_id_size()))?;
            kv(
                w,
                6,
                "VolumeLabelOffset",
                format!("0x{:x}", vol.volume_label_offset()),
            )?;
            if let Some(offset) = vol.volume_label_offset_unicode() {
                kv(w, 6, "VolumeLabelOffsetUnicode", format!("0x{offset:x}"))?;
            }
        }
        kv(w, 6, "DriveType", format!("{:?}", vol.drive_type()))?;
        kv(
            w,
            6,
            "DriveSerialNumber",
            format!("0x{:08X}", vol.drive_serial_number()),
        )?;
        let label = vol.volume_label();
        kv(w, 6, "VolumeLabel", if label.is_empty() { "[EMPTY]" } else { label })?;
    }
    kv(w, 4, "LocalBasePath", opt(info.local_base_path()))?;

    if let Some(cnr) = info.common_network_relative_link() {
        writeln!(w, "    {{S_2.3.2 - CommonNetworkRelativeLink}}")?;
        if !opts.short {
            kv(
                w,
                6,
                "CommonNetworkRelativeLinkSize",
                format!("{} bytes", cnr.common_network_relative_link_size()),
            )?;
            kv(w, 6, "Flags", format!("0x{:08X}", cnr.flags().bits()))?;
            kv(w, 6, "NetNameOffset", format!("0x{:x}", cnr.net_name_offset()))?;
            kv(
                w,
                6,
                "DeviceNameOffset",
                format!("0x{:x}", cnr.device_name_offset()),
            )?;
            if let Some(offset) = cnr.net_name_offset_unicode() {
                kv(w, 6, "NetNameOffsetUnicode", format!("0x{offset:x}"))?;
            }
            if let Some(offset) = cnr.device_name_offset_unicode() {
                kv(w, 6, "DeviceNameOffsetUnicode", format!("0x{offset:x}"))?;
            }
        }
        kv(w, 6, "Flags (decoded)", flag_names(cnr.flags()))?;
        let provider = match cnr.network_provider_type() {
            Some(provider) => format!("{provider:?}"),
            None => "[N/A]".to_string(),
        };
        kv(w, 6, "NetworkProviderType", provider)?;
        kv(w, 6, "NetName", opt(cnr.net_name()))?;
        kv(w, 6, "DeviceName", opt(cnr.device_name()))?;
        kv(w, 6, "NetNameUnicode", opt(cnr.net_name_unicode()))?;
        kv(w, 6, "DeviceNameUnicode", opt(cnr.device_name_unicode()))?;
    }

    kv(w, 4, "CommonPathSuffix", opt(info.common_path_suffix()))?;
    kv(
        w,
        4,
        "LocalBasePathUnicode",
        opt(info.local_base_path_unicode()),
    )?;
    kv(
        w,
        4,
        "CommonPathSuffixUnicode",
        opt(info.common_path_suffix_unicode()),
    )?;
    Ok(())
}

fn write_stringdata<W: Write>(w: &mut W, link: &ShellLinkFile) -> io::Result<()> {
    writeln!(w, "  {{S_2.4 - StringData}}")?;
    let entry = |s: Option<&SizedString>| match s {
        Some(s) => format!("{} ({} units)", s.as_ref(), s.char_count()),
        None => "[NOT SET]".to_string(),
    };
    let data = link.string_data();
    kv(w, 4, "NameString", entry(data.name_string().as_ref()))?;
    kv(w, 4, "RelativePath", entry(data.relative_path().as_ref()))?;
    kv(w, 4, "WorkingDir", entry(data.working_dir().as_ref()))?;
    kv(
        w,
        4,
        "CommandLineArguments",
        entry(data.command_line_arguments().as_ref()),
    )?;
    kv(w, 4, "IconLocation", entry(data.icon_location().as_ref()))?;
    Ok(())
}

fn write_extradata<W: Write>(w: &mut W, link: &ShellLinkFile, opts: &Options) -> io::Result<()> {
    let extra = link.extra_data();
    writeln!(w, "  {{S_2.5 - ExtraData}}")?;
    kv(w, 4, "BlocksPresent", flag_names(extra.observed()))?;
    if !opts.short {
        kv(w, 4, "TerminalBlock", format!("0x{:08X}", extra.terminal()))?;
    }
    for block in extra.blocks() {
        write_block(w, block, opts)?;
    }
    Ok(())
}

fn write_block<W: Write>(w: &mut W, block: &ExtraDataBlock, opts: &Options) -> io::Result<()> {
    let label = match block.payload() {
        BlockPayload::Console(_) => "{S_2.5.1 - ConsoleDataBlock}",
        BlockPayload::ConsoleFe(_) => "{S_2.5.2 - ConsoleFEDataBlock}",
        BlockPayload::Darwin(_) => "{S_2.5.3 - DarwinDataBlock}",
        BlockPayload::EnvironmentVariable(_) => "{S_2.5.4 - EnvironmentVariableDataBlock}",
        BlockPayload::IconEnvironment(_) => "{S_2.5.5 - IconEnvironmentDataBlock}",
        BlockPayload::KnownFolder(_) => "{S_2.5.6 - KnownFolderDataBlock}",
        BlockPayload::PropertyStore(_) => "{S_2.5.7 - PropertyStoreDataBlock}",
        BlockPayload::Shim(_) => "{S_2.5.8 - ShimDataBlock}",
        BlockPayload::SpecialFolder(_) => "{S_2.5.9 - SpecialFolderDataBlock}",
        BlockPayload::Tracker(_) => "{S_2.5.10 - TrackerDataBlock}",
        BlockPayload::VistaAndAboveIdList(_) => "{S_2.5.11 - VistaAndAboveIDListDataBlock}",
        BlockPayload::Unknown(_) => "{Unrecognized block}",
    };
    writeln!(w, "    {label}")?;
    if !opts.short {
        kv(w, 6, "FileOffset", format!("0x{:x}", block.offset()))?;
        kv(w, 6, "Size", format!("{} bytes", block.size()))?;
        kv(w, 6, "Signature", format!("0x{:08X}", block.signature()))?;
    }

    match block.payload() {
        BlockPayload::Console(console) => {
            kv(
                w,
                6,
                "FillAttributes",
                flag_names(console.fill_attributes()),
            )?;
            kv(
                w,
                6,
                "PopupFillAttributes",
                flag_names(console.popup_fill_attributes()),
            )?;
            kv(
                w,
                6,
                "ScreenBufferSize",
                format!(
                    "{} x {}",
                    console.screen_buffer_size_x(),
                    console.screen_buffer_size_y()
                ),
            )?;
            kv(
                w,
                6,
                "WindowSize",
                format!("{} x {}", console.window_size_x(), console.window_size_y()),
            )?;
            kv(
                w,
                6,
                "WindowOrigin",
                format!(
                    "{}, {}",
                    console.window_origin_x(),
                    console.window_origin_y()
                ),
            )?;
            kv(w, 6, "FontSize", format!("0x{:08X}", console.font_size()))?;
            kv(w, 6, "FontFamily", flag_names(console.font_family()))?;
            kv(w, 6, "FontWeight", console.font_weight().to_string())?;
            kv(w, 6, "FaceName", console.face_name())?;
            kv(w, 6, "CursorSize", console.cursor_size().to_string())?;
            kv(w, 6, "FullScreen", console.full_screen().to_string())?;
            kv(w, 6, "QuickEdit", console.quick_edit().to_string())?;
            kv(w, 6, "InsertMode", console.insert_mode().to_string())?;
            kv(w, 6, "AutoPosition", console.auto_position().to_string())?;
            kv(
                w,
                6,
                "HistoryBufferSize",
                console.history_buffer_size().to_string(),
            )?;
            kv(
                w,
                6,
                "NumberOfHistoryBuffers",
                console.number_of_history_buffers().to_string(),
            )?;
            kv(w, 6, "HistoryNoDup", console.history_no_dup().to_string())?;
            if !opts.short {
                let colors: Vec<String> = console
                    .color_table()
                    .iter()
                    .map(|c| format!("0x{c:06X}"))
                    .collect();
                kv(w, 6, "ColorTable", colors.join(" "))?;
            }
        }
        BlockPayload::ConsoleFe(fe) => {
            kv(w, 6, "CodePage", fe.code_page().to_string())?;
        }
        BlockPayload::Darwin(darwin) => {
            kv(w, 6, "DarwinDataAnsi", darwin.darwin_data_ansi())?;
            kv(
                w,
                6,
                "DarwinDataUnicode",
                opt(darwin.darwin_data_unicode().as_deref()),
            )?;
        }
        BlockPayload::EnvironmentVariable(env) | BlockPayload::IconEnvironment(env) => {
            kv(w, 6, "TargetAnsi", env.target_ansi())?;
            kv(w, 6, "TargetUnicode", opt(env.target_unicode().as_deref()))?;
        }
        BlockPayload::KnownFolder(folder) => {
            kv(w, 6, "KnownFolderID", folder.known_folder_id().braced())?;
            kv(w, 6, "Offset", format!("0x{:x}", folder.offset()))?;
        }
        BlockPayload::PropertyStore(store_block) => {
            kv(w, 6, "NumStores", store_block.stores().len().to_string())?;
            for store in store_block.stores() {
                write_store(w, 6, store, opts)?;
            }
        }
        BlockPayload::Shim(shim) => {
            kv(w, 6, "LayerName", shim.layer_name())?;
        }
        BlockPayload::SpecialFolder(folder) => {
            kv(w, 6, "SpecialFolderID", folder.special_folder_id().to_string())?;
            kv(w, 6, "Offset", format!("0x{:x}", folder.offset()))?;
        }
        BlockPayload::Tracker(tracker) => {
            if !opts.short {
                kv(w, 6, "Length", format!("{} bytes", tracker.length()))?;
                kv(w, 6, "Version", tracker.version().to_string())?;
            }
            kv(w, 6, "MachineID", tracker.machine_id())?;
            write_droid(w, "Droid1", &tracker.droid()[0], opts)?;
            write_droid(w, "Droid2", &tracker.droid()[1], opts)?;
            write_droid(w, "DroidBirth1", &tracker.droid_birth()[0], opts)?;
            write_droid(w, "DroidBirth2", &tracker.droid_birth()[1], opts)?;
        }
        BlockPayload::VistaAndAboveIdList(list) => {
            kv(w, 6, "NumItemIDs", list.id_list().len().to_string())?;
        }
        BlockPayload::Unknown(raw) => {
            kv(w, 6, "PayloadBytes", raw.len().to_string())?;
        }
    }
    Ok(())
}

fn write_droid<W: Write>(w: &mut W, name: &str, guid: &Guid, opts: &Options) -> io::Result<()> {
    let detail = guid.describe();
    kv(w, 6, name, guid.braced())?;
    if !opts.short {
        kv(w, 6, &format!("{name} Version"), &detail.version)?;
        kv(w, 6, &format!("{name} Variant"), &detail.variant)?;
    }
    let time = match &detail.time {
        Some(time) if !opts.short => time.format_long(),
        Some(time) => time.format_short(),
        None => "[N/A]".to_string(),
    };
    kv(w, 6, &format!("{name} Time"), time)?;
    let clock = match detail.clock_sequence {
        Some(clock) => clock.to_string(),
        None => "[N/A]".to_string(),
    };
    kv(w, 6, &format!("{name} ClockSeq"), clock)?;
    kv(
        w,
        6,
        &format!("{name} Node"),
        detail.node.as_deref().unwrap_or("[N/A]"),
    )?;
    Ok(())
}

fn write_store<W: Write>(
    w: &mut W,
    indent: usize,
    store: &SerializedPropertyStore,
    opts: &Options,
) -> io::Result<()> {
    writeln!(
        w,
        "{:indent$}{{MS-PROPSTORE - SerializedPropertyStore}}",
        "",
        indent = indent
    )?;
    let field = indent + 2;
    if !opts.short {
        kv(w, field, "Position", format!("0x{:x}", store.position()))?;
        kv(w, field, "StorageSize", format!("{} bytes", store.storage_size()))?;
    }
    kv(w, field, "FormatID", store.format_id().braced())?;
    kv(w, field, "NameType", format!("{:?}", store.name_type()))?;
    kv(w, field, "NumValues", store.values().len().to_string())?;
    for value in store.values() {
        kv(
            w,
            field,
            &format!("Value [{}]", value.name()),
            format!(
                "{} = {}",
                value.value().type_name(),
                render_variant(value.value())
            ),
        )?;
    }
    Ok(())
}

pub fn render_variant(value: &PropVariant) -> String {
    match value {
        PropVariant::Empty => "[EMPTY]".to_string(),
        PropVariant::Null => "[NULL]".to_string(),
        PropVariant::I1(v) => v.to_string(),
        PropVariant::UI1(v) => v.to_string(),
        PropVariant::I2(v) => v.to_string(),
        PropVariant::UI2(v) => v.to_string(),
        PropVariant::I4(v) | PropVariant::Int(v) => v.to_string(),
        PropVariant::UI4(v) | PropVariant::UInt(v) => v.to_string(),
        PropVariant::I8(v) => v.to_string(),
        PropVariant::UI8(v) => v.to_string(),
        PropVariant::R4(v) => v.to_string(),
        PropVariant::R8(v) => v.to_string(),
        PropVariant::Bool(v) => v.to_string(),
        PropVariant::Error(v) => format!("HRESULT 0x{v:08X}"),
        PropVariant::Currency(v) => format!("{}", *v as f64 / 10_000.0),
        PropVariant::Date(v) => format!("{v} (days since 1899-12-30)"),
        PropVariant::FileTime(v) => v.format_long(),
        PropVariant::Clsid(guid) => {
            let detail = guid.describe();
            match (detail.time, detail.node) {
                (Some(time), Some(node)) => format!(
                    "{} (time {}, node {})",
                    guid.braced(),
                    time.format_long(),
                    node
                ),
                _ => guid.braced(),
            }
        }
        PropVariant::Decimal(v) => v.to_string(),
        PropVariant::Bstr(v)
        | PropVariant::Lpstr(v)
        | PropVariant::Lpwstr(v)
        | PropVariant::Stream(v)
        | PropVariant::Storage(v)
        | PropVariant::StreamedObject(v)
        | PropVariant::StoredObject(v) => v.clone(),
        PropVariant::Blob(bytes) | PropVariant::BlobObject(bytes) | PropVariant::ClipboardData(bytes) => {
            format!("[{} opaque bytes]", bytes.len())
        }
        PropVariant::VersionedStream {
            version_guid,
            stream_name,
        } => format!("{} {}", version_guid.braced(), stream_name),
        PropVariant::Vector(elements) => {
            let rendered: Vec<String> = elements.iter().map(render_variant).collect();
            format!("[{}]", rendered.join("; "))
        }
        PropVariant::Array {
            dimensions,
            elements,
            ..
        } => {
            let dims: Vec<String> = dimensions.iter().map(|d| d.size.to_string()).collect();
            let rendered: Vec<String> = elements.iter().map(render_variant).collect();
            format!("array[{}] [{}]", dims.join(" x "), rendered.join("; "))
        }
        PropVariant::Unsupported { type_code, raw } => {
            format!(
                "[not interpreted: type 0x{type_code:04X}, {} bytes]",
                raw.len()
            )
        }
    }
}
