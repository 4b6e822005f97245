//! The delimited renderer: a fixed column set over the whole model (or a
//! reduced set under `-s`), one header row, one record per file. For csv,
//! commas inside values are substituted with semicolons so rows stay
//! rectangular in a spreadsheet.

use std::io::{self, Write};

use lnkspect::extradata::ExtraData;
use lnkspect::{FileTime, Guid, LinkInfo, ShellLinkFile, SizedString};

const NOT_SET: &str = "[NOT SET]";
const NOT_APPLICABLE: &str = "[N/A]";

pub(crate) fn flag_names<F: bitflags::Flags>(flags: &F) -> String {
    let names: Vec<&'static str> = flags.iter_names().map(|(name, _)| name).collect();
    if names.is_empty() {
        "(none)".to_string()
    } else {
        names.join(" | ")
    }
}

pub fn write_names<W: Write>(
    w: &mut W,
    record: &[(&'static str, String)],
    sep: char,
) -> io::Result<()> {
    let names: Vec<&str> = record.iter().map(|(name, _)| *name).collect();
    writeln!(w, "{}", names.join(&sep.to_string()))
}

pub fn write_values<W: Write>(
    w: &mut W,
    record: &[(&'static str, String)],
    sep: char,
    csv: bool,
) -> io::Result<()> {
    let values: Vec<String> = record
        .iter()
        .map(|(_, value)| {
            if csv {
                value.replace(',', ";")
            } else {
                value.clone()
            }
        })
        .collect();
    writeln!(w, "{}", values.join(&sep.to_string()))
}

/// Build the (column, value) pairs for one decoded file. The column set is a
/// function of `short` alone, never of which regions the file happens to
/// contain, so every record lines up under the same header row.
pub fn record(file_name: &str, link: &ShellLinkFile, short: bool) -> Vec<(&'static str, String)> {
    let mut row: Vec<(&'static str, String)> = Vec::new();
    let header = link.header();
    let date = |ft: &FileTime| {
        if short {
            ft.format_short()
        } else {
            ft.format_long()
        }
    };

    row.push(("File Name", file_name.to_string()));
    if !short {
        row.push(("Hdr Size", header.header_size().to_string()));
        row.push(("Hdr CLSID", header.link_clsid().braced()));
        row.push(("Hdr Flags", format!("0x{:08X}", header.link_flags().bits())));
    }
    row.push(("Hdr Flags Decoded", flag_names(header.link_flags())));
    row.push(("Hdr Attributes", flag_names(header.file_attributes())));
    row.push(("Hdr FileCreate", date(header.creation_time())));
    row.push(("Hdr FileAccess", date(header.access_time())));
    row.push(("Hdr FileWrite", date(header.write_time())));
    row.push(("Hdr TargetSize", header.file_size().to_string()));
    row.push(("Hdr IconIndex", header.icon_index().to_string()));
    row.push(("Hdr WindowState", format!("{:?}", header.show_command())));
    row.push(("Hdr HotKeys", header.hotkey().describe()));
    if !short {
        row.push(("Hdr Reserved1", header.reserved1().to_string()));
        row.push(("Hdr Reserved2", header.reserved2().to_string()));
        row.push(("Hdr Reserved3", header.reserved3().to_string()));
    }

    if !short {
        row.push((
            "IDList Size",
            link.link_target_id_list()
                .map(|l| l.size().to_string())
                .unwrap_or_else(|| NOT_SET.to_string()),
        ));
    }
    row.push((
        "IDList No Items",
        link.link_target_id_list()
            .map(|l| l.id_list().len().to_string())
            .unwrap_or_else(|| NOT_SET.to_string()),
    ));

    linkinfo_columns(&mut row, link.link_info(), short);
    stringdata_columns(&mut row, link);
    extradata_columns(&mut row, link.extra_data(), short);

    row
}

fn linkinfo_columns(row: &mut Vec<(&'static str, String)>, info: Option<&LinkInfo>, short: bool) {
    let get = |f: &dyn Fn(&LinkInfo) -> String| match info {
        Some(info) => f(info),
        None => NOT_SET.to_string(),
    };
    let opt_str = |value: Option<&str>| value.unwrap_or(NOT_SET).to_string();

    if !short {
        row.push(("LinkInfo Size", get(&|i| i.link_info_size().to_string())));
        row.push((
            "LinkInfo Hdr Size",
            get(&|i| i.link_info_header_size().to_string()),
        ));
        row.push((
            "LinkInfo Flags",
            get(&|i| format!("0x{:08X}", i.link_info_flags().bits())),
        ));
        row.push((
            "LinkInfo VolID Offset",
            get(&|i| format!("0x{:x}", i.volume_id_offset())),
        ));
        row.push((
            "LinkInfo Base Path Offset",
            get(&|i| format!("0x{:x}", i.local_base_path_offset())),
        ));
        row.push((
            "LinkInfo CNR Offset",
            get(&|i| format!("0x{:x}", i.common_network_relative_link_offset())),
        ));
        row.push((
            "LinkInfo CPS Offset",
            get(&|i| format!("0x{:x}", i.common_path_suffix_offset())),
        ));
        row.push((
            "LinkInfo LBP Offset Unicode",
            get(&|i| match i.local_base_path_offset_unicode() {
                Some(offset) => format!("0x{offset:x}"),
                None => NOT_APPLICABLE.to_string(),
            }),
        ));
        row.push((
            "LinkInfo CPS Offset Unicode",
            get(&|i| match i.common_path_suffix_offset_unicode() {
                Some(offset) => format!("0x{offset:x}"),
                None => NOT_APPLICABLE.to_string(),
            }),
        ));
        row.push((
            "LinkInfo VolID Size",
            get(&|i| match i.volume_id() {
                Some(vol) => vol.volume_id_size().to_string(),
                None => NOT_SET.to_string(),
            }),
        ));
    }
    row.push((
        "LinkInfo VolID Drive Type",
        get(&|i| match i.volume_id() {
            Some(vol) => format!("{:?}", vol.drive_type()),
            None => NOT_SET.to_string(),
        }),
    ));
    row.push((
        "LinkInfo VolID Drive Ser No",
        get(&|i| match i.volume_id() {
            Some(vol) => format!("0x{:08X}", vol.drive_serial_number()),
            None => NOT_SET.to_string(),
        }),
    ));
    row.push((
        "LinkInfo VolID Vol Label",
        get(&|i| match i.volume_id() {
            Some(vol) => vol.volume_label().to_string(),
            None => NOT_SET.to_string(),
        }),
    ));
    row.push((
        "LinkInfo Local Base Path",
        get(&|i| opt_str(i.local_base_path())),
    ));

    if !short {
        row.push((
            "LinkInfo CNR Size",
            get(&|i| match i.common_network_relative_link() {
                Some(cnr) => cnr.common_network_relative_link_size().to_string(),
                None => NOT_SET.to_string(),
            }),
        ));
        row.push((
            "LinkInfo CNR Flags",
            get(&|i| match i.common_network_relative_link() {
                Some(cnr) => format!("0x{:08X}", cnr.flags().bits()),
                None => NOT_SET.to_string(),
            }),
        ));
    }
    row.push((
        "LinkInfo CNR NetwkProviderType",
        get(&|i| match i.common_network_relative_link() {
            Some(cnr) => match cnr.network_provider_type() {
                Some(provider) => format!("{provider:?}"),
                None => NOT_APPLICABLE.to_string(),
            },
            None => NOT_SET.to_string(),
        }),
    ));
    row.push((
        "LinkInfo CNR NetName",
        get(&|i| match i.common_network_relative_link() {
            Some(cnr) => opt_str(cnr.net_name()),
            None => NOT_SET.to_string(),
        }),
    ));
    row.push((
        "LinkInfo CNR DeviceName",
        get(&|i| match i.common_network_relative_link() {
            Some(cnr) => opt_str(cnr.device_name()),
            None => NOT_SET.to_string(),
        }),
    ));
    row.push((
        "LinkInfo Common Path Suffix",
        get(&|i| opt_str(i.common_path_suffix())),
    ));
    if !short {
        row.push((
            "LinkInfo LBP Unicode",
            get(&|i| opt_str(i.local_base_path_unicode())),
        ));
        row.push((
            "LinkInfo CPS Unicode",
            get(&|i| opt_str(i.common_path_suffix_unicode())),
        ));
    }
}

fn stringdata_columns(row: &mut Vec<(&'static str, String)>, link: &ShellLinkFile) {
    let entry = |s: &Option<SizedString>| match s {
        Some(s) => s.as_ref().to_string(),
        None => NOT_SET.to_string(),
    };
    let data = link.string_data();
    row.push(("SD Name", entry(data.name_string())));
    row.push(("SD Relative Path", entry(data.relative_path())));
    row.push(("SD Working Dir", entry(data.working_dir())));
    row.push(("SD Arguments", entry(data.command_line_arguments())));
    row.push(("SD Icon Location", entry(data.icon_location())));
}

fn extradata_columns(row: &mut Vec<(&'static str, String)>, extra: &ExtraData, short: bool) {
    row.push(("ED Blocks Present", flag_names(extra.observed())));
    if !short {
        row.push(("ED Terminal", format!("0x{:08X}", extra.terminal())));
    }

    row.push((
        "ED EVDB TargetAnsi",
        extra
            .environment_variable()
            .map(|b| b.target_ansi().clone())
            .unwrap_or_else(|| NOT_SET.to_string()),
    ));
    row.push((
        "ED EVDB TargetUnicode",
        extra
            .environment_variable()
            .and_then(|b| b.target_unicode().clone())
            .unwrap_or_else(|| NOT_SET.to_string()),
    ));
    row.push((
        "ED CFEDB CodePage",
        extra
            .console_fe()
            .map(|b| b.code_page().to_string())
            .unwrap_or_else(|| NOT_SET.to_string()),
    ));
    row.push((
        "ED DDB DarwinDataAnsi",
        extra
            .darwin()
            .map(|b| b.darwin_data_ansi().clone())
            .unwrap_or_else(|| NOT_SET.to_string()),
    ));
    row.push((
        "ED IEDB TargetAnsi",
        extra
            .icon_environment()
            .map(|b| b.target_ansi().clone())
            .unwrap_or_else(|| NOT_SET.to_string()),
    ));
    row.push((
        "ED KFDB KnownFolderID",
        extra
            .known_folder()
            .map(|b| b.known_folder_id().braced())
            .unwrap_or_else(|| NOT_SET.to_string()),
    ));
    row.push((
        "ED PS No Stores",
        extra
            .property_store()
            .map(|b| b.stores().len().to_string())
            .unwrap_or_else(|| NOT_SET.to_string()),
    ));
    row.push((
        "ED Shim LayerName",
        extra
            .shim()
            .map(|b| b.layer_name().to_string())
            .unwrap_or_else(|| NOT_SET.to_string()),
    ));
    row.push((
        "ED SFolderData ID",
        extra
            .special_folder()
            .map(|b| b.special_folder_id().to_string())
            .unwrap_or_else(|| NOT_SET.to_string()),
    ));

    row.push((
        "ED TrackerData MachineID",
        extra
            .tracker()
            .map(|b| b.machine_id().clone())
            .unwrap_or_else(|| NOT_SET.to_string()),
    ));
    droid_columns(
        row,
        [
            ("ED TD Droid1", "ED TD Droid1 Version", "ED TD Droid1 Variant", "ED TD Droid1 Time", "ED TD Droid1 Clock Seq", "ED TD Droid1 Node"),
            ("ED TD Droid2", "ED TD Droid2 Version", "ED TD Droid2 Variant", "ED TD Droid2 Time", "ED TD Droid2 Clock Seq", "ED TD Droid2 Node"),
            ("ED TD DroidBirth1", "ED TD DroidBirth1 Version", "ED TD DroidBirth1 Variant", "ED TD DroidBirth1 Time", "ED TD DroidBirth1 Clock Seq", "ED TD DroidBirth1 Node"),
            ("ED TD DroidBirth2", "ED TD DroidBirth2 Version", "ED TD DroidBirth2 Variant", "ED TD DroidBirth2 Time", "ED TD DroidBirth2 Clock Seq", "ED TD DroidBirth2 Node"),
        ],
        extra,
        short,
    );

    row.push((
        "ED Vista IDList No Items",
        extra
            .vista_and_above_id_list()
            .map(|b| b.id_list().len().to_string())
            .unwrap_or_else(|| NOT_SET.to_string()),
    ));
}

type DroidHeaders = (
    &'static str,
    &'static str,
    &'static str,
    &'static str,
    &'static str,
    &'static str,
);

fn droid_columns(
    row: &mut Vec<(&'static str, String)>,
    headers: [DroidHeaders; 4],
    extra: &ExtraData,
    short: bool,
) {
    let droids: [Option<&Guid>; 4] = match extra.tracker() {
        Some(tracker) => [
            Some(&tracker.droid()[0]),
            Some(&tracker.droid()[1]),
            Some(&tracker.droid_birth()[0]),
            Some(&tracker.droid_birth()[1]),
        ],
        None => [None, None, None, None],
    };

    for ((uuid_h, version_h, variant_h, time_h, clock_h, node_h), droid) in
        headers.into_iter().zip(droids)
    {
        match droid {
            Some(guid) => {
                let detail = guid.describe();
                row.push((uuid_h, guid.braced()));
                if !short {
                    row.push((version_h, detail.version.clone()));
                    row.push((variant_h, detail.variant.clone()));
                }
                row.push((
                    time_h,
                    detail
                        .time
                        .map(|t| if short { t.format_short() } else { t.format_long() })
                        .unwrap_or_else(|| NOT_APPLICABLE.to_string()),
                ));
                row.push((
                    clock_h,
                    detail
                        .clock_sequence
                        .map(|c| c.to_string())
                        .unwrap_or_else(|| NOT_APPLICABLE.to_string()),
                ));
                row.push((node_h, detail.node.unwrap_or_else(|| NOT_APPLICABLE.to_string())));
            }
            None => {
                row.push((uuid_h, NOT_SET.to_string()));
                if !short {
                    row.push((version_h, NOT_SET.to_string()));
                    row.push((variant_h, NOT_SET.to_string()));
                }
                row.push((time_h, NOT_SET.to_string()));
                row.push((clock_h, NOT_SET.to_string()));
                row.push((node_h, NOT_SET.to_string()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_substitutes_commas_inside_values() {
        let record = vec![("A", "x,y".to_string()), ("B", "z".to_string())];
        let mut out = Vec::new();
        write_values(&mut out, &record, ',', true).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "x;y,z\n");
    }

    #[test]
    fn tsv_leaves_values_alone() {
        let record = vec![("A", "x,y".to_string())];
        let mut out = Vec::new();
        write_values(&mut out, &record, '\t', false).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "x,y\n");
    }

    #[test]
    fn record_columns_do_not_depend_on_file_contents() {
        // A header-only file and a fully-populated one must line up under
        // the same header row.
        let minimal = minimal_link();
        let link = ShellLinkFile::parse(&minimal).unwrap();
        let names: Vec<&str> = record("a.lnk", &link, false).iter().map(|(n, _)| *n).collect();
        let names_short: Vec<&str> =
            record("a.lnk", &link, true).iter().map(|(n, _)| *n).collect();
        assert!(names.len() > names_short.len());
        assert_eq!(names.iter().filter(|n| **n == "File Name").count(), 1);
    }

    fn minimal_link() -> Vec<u8> {
        let mut data = vec![0u8; 0x4c];
        data[0] = 0x4c;
        data[4..20].copy_from_slice(&[
            0x01, 0x14, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0xc0, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x46,
        ]);
        data[60] = 0x01; // ShowNormal
        data
    }
}
