use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use sonatalink_frame::Message;
use sonatalink_marshal::channelizer::{ChannelizerMessageCode, Status};
use sonatalink_marshal::common::NssMessage;
use sonatalink_marshal::dx::DxMessageCode;
use sonatalink_marshal::tscope::TscopeMessageCode;
use sonatalink_marshal::{Layout, LayoutSummary};

#[derive(Clone, Debug, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// Interface-qualified name of a message code, e.g. `channelizer:send-status`.
pub fn code_name(code: u32) -> String {
    if let Ok(c) = ChannelizerMessageCode::try_from(code) {
        return format!("channelizer:{c}");
    }
    if let Ok(c) = DxMessageCode::try_from(code) {
        return format!("dx:{c}");
    }
    if let Ok(c) = TscopeMessageCode::try_from(code) {
        return format!("tscope:{c}");
    }
    format!("unknown:{code}")
}

/// One-line summary of a body this tool knows how to decode.
pub fn body_summary(message: &Message) -> Option<String> {
    let code = message.header.code;
    if code == ChannelizerMessageCode::SendStatus.code() as u32 {
        let status: Status = message.decode().ok()?;
        return Some(format!(
            "state={} center_sky_freq_mhz={}",
            status.state, status.center_sky_freq_mhz
        ));
    }
    if code == ChannelizerMessageCode::SendMessage.code() as u32
        || code == DxMessageCode::SendDxMessage.code() as u32
    {
        let note: NssMessage = message.decode().ok()?;
        return Some(format!("{}: {}", note.severity, note.description()));
    }
    None
}

#[derive(Serialize)]
struct MessageOutput {
    message_number: u32,
    code: u32,
    code_name: String,
    activity_id: i32,
    sender: String,
    receiver: String,
    timestamp: String,
    data_length: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    body: Option<String>,
}

impl MessageOutput {
    fn new(message: &Message) -> Self {
        let h = &message.header;
        Self {
            message_number: h.message_number,
            code: h.code,
            code_name: code_name(h.code),
            activity_id: h.activity_id,
            sender: h.sender_name().into_owned(),
            receiver: h.receiver_name().into_owned(),
            timestamp: format!("{}.{:06}", h.timestamp.tv_sec, h.timestamp.tv_usec),
            data_length: h.data_length,
            body: body_summary(message),
        }
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.message_number.to_string(),
            self.code_name.clone(),
            self.activity_id.to_string(),
            self.sender.clone(),
            self.receiver.clone(),
            self.data_length.to_string(),
            self.body.clone().unwrap_or_default(),
        ]
    }
}

const MESSAGE_COLUMNS: [&str; 7] = ["#", "CODE", "ACTIVITY", "SENDER", "RECEIVER", "LENGTH", "BODY"];

/// Print messages as they arrive (one line or one table each).
pub fn print_message(message: &Message, format: OutputFormat) {
    print_messages(std::slice::from_ref(message), format);
}

/// Print a batch of messages; tables get one row per message.
pub fn print_messages(messages: &[Message], format: OutputFormat) {
    let rows: Vec<MessageOutput> = messages.iter().map(MessageOutput::new).collect();
    match format {
        OutputFormat::Json => {
            for row in &rows {
                println!(
                    "{}",
                    serde_json::to_string(row).unwrap_or_else(|_| "{}".to_string())
                );
            }
        }
        OutputFormat::Table => {
            if rows.is_empty() {
                return;
            }
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(MESSAGE_COLUMNS.to_vec());
            for row in &rows {
                table.add_row(row.row());
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for row in &rows {
                print!(
                    "#{} {} activity={} {}->{} length={}",
                    row.message_number,
                    row.code_name,
                    row.activity_id,
                    row.sender,
                    row.receiver,
                    row.data_length
                );
                match &row.body {
                    Some(body) => println!(" {body}"),
                    None => println!(),
                }
            }
        }
    }
}

#[derive(Serialize)]
struct FieldOutput<'a> {
    name: &'a str,
    offset: usize,
    size: usize,
    kind: String,
    count: usize,
}

#[derive(Serialize)]
struct LayoutOutput<'a> {
    name: &'a str,
    size: usize,
    align: usize,
    fields: Vec<FieldOutput<'a>>,
}

impl<'a> LayoutOutput<'a> {
    fn new(layout: &'a Layout) -> Self {
        Self {
            name: layout.name,
            size: layout.size,
            align: layout.align(),
            fields: layout
                .fields
                .iter()
                .map(|f| FieldOutput {
                    name: f.name,
                    offset: f.offset,
                    size: f.size(),
                    kind: f.kind.describe(),
                    count: f.count,
                })
                .collect(),
        }
    }
}

#[derive(Serialize)]
struct LayoutsOutput<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    fingerprint: Option<String>,
    records: Vec<LayoutOutput<'a>>,
}

/// Print a summary of `layouts`, with the check result when there is one.
pub fn print_layouts(layouts: &[&Layout], summary: Option<&LayoutSummary>, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = LayoutsOutput {
                fingerprint: summary.map(|s| format!("{:016x}", s.fingerprint)),
                records: layouts.iter().map(|l| LayoutOutput::new(l)).collect(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["RECORD", "SIZE", "ALIGN", "FIELDS"]);
            for layout in layouts {
                table.add_row(vec![
                    layout.name.to_string(),
                    layout.size.to_string(),
                    layout.align().to_string(),
                    layout.fields.len().to_string(),
                ]);
            }
            println!("{table}");
            if let Some(summary) = summary {
                println!(
                    "{} records verified, fingerprint {:016x}",
                    summary.records, summary.fingerprint
                );
            }
        }
        OutputFormat::Pretty => {
            for layout in layouts {
                print!("{layout}");
            }
            if let Some(summary) = summary {
                println!("fingerprint {:016x}", summary.fingerprint);
            }
        }
    }
}

/// Print every field of one record.
pub fn print_layout_fields(layout: &Layout, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(&LayoutOutput::new(layout)).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["OFFSET", "FIELD", "TYPE", "SIZE"]);
            for field in layout.fields {
                let kind = if field.count > 1 {
                    format!("{}[{}]", field.kind.describe(), field.count)
                } else {
                    field.kind.describe()
                };
                table.add_row(vec![
                    field.offset.to_string(),
                    field.name.to_string(),
                    kind,
                    field.size().to_string(),
                ]);
            }
            println!("{} ({} bytes)", layout.name, layout.size);
            println!("{table}");
        }
        OutputFormat::Pretty => print!("{layout}"),
    }
}

#[cfg(test)]
mod tests {
    use sonatalink_marshal::common::MessageHeader;
    use sonatalink_marshal::marshall;

    use super::*;

    #[test]
    fn code_names_are_interface_qualified() {
        assert_eq!(code_name(80_004), "channelizer:send-status");
        assert_eq!(code_name(40_012), "dx:dx-tuned");
        assert_eq!(code_name(50_004), "tscope:point-subarray");
        assert_eq!(code_name(7), "unknown:7");
    }

    #[test]
    fn status_bodies_are_summarized() {
        let message = Message {
            header: MessageHeader {
                code: 80_004,
                data_length: 32,
                ..MessageHeader::default()
            },
            body: marshall(&Status::default()),
        };
        assert_eq!(
            body_summary(&message).as_deref(),
            Some("state=idle center_sky_freq_mhz=-1")
        );
    }

    #[test]
    fn undecodable_bodies_have_no_summary() {
        let message = Message {
            header: MessageHeader {
                code: 80_004,
                data_length: 3,
                ..MessageHeader::default()
            },
            body: marshall(&Status::default()).slice(..3),
        };
        assert!(body_summary(&message).is_none());
    }
}
