use std::{fs, path::Path};

use anyhow::Context;
use clap::ValueEnum;
use macro_schema::CompiledMacro;
use tracing::debug;

/// Firmware family the generated header is compiled into.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Platform {
    /// ATmega32U4 boards: frames live in PROGMEM and are read with `memcpy_P`.
    #[default]
    Avr,
    Esp32s3,
    Pico,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EmitOptions {
    pub looped: bool,
    pub platform: Platform,
}

pub fn emit_c_header(frames: &CompiledMacro, options: &EmitOptions) -> String {
    let progmem = options.platform == Platform::Avr;
    let count = frames.len();
    let mut out = vec![
        "// Auto-generated from macro source".to_string(),
        "// DO NOT EDIT MANUALLY".to_string(),
        String::new(),
        "#ifndef EMBEDDED_MACRO_H".to_string(),
        "#define EMBEDDED_MACRO_H".to_string(),
        String::new(),
        "#include <stdint.h>".to_string(),
        "#include <string.h>".to_string(),
    ];
    if progmem {
        out.push("#include <avr/pgmspace.h>".to_string());
    }
    out.push(String::new());

    out.push("// Macro configuration".to_string());
    out.push("#define EMBEDDED_MACRO_ENABLED 1".to_string());
    out.push(format!(
        "#define EMBEDDED_MACRO_LOOP {}",
        if options.looped { 1 } else { 0 }
    ));
    out.push(format!("#define EMBEDDED_MACRO_FRAME_COUNT {count}"));
    out.push(String::new());

    let seconds = f64::from(frames.total_duration_ms()) / 1000.0;
    out.push(format!(
        "// Macro duration: {seconds:.2} seconds ({count} frames)"
    ));
    out.push(String::new());

    out.push("typedef struct {".to_string());
    out.push("    uint32_t timestamp_ms;  // Timestamp in milliseconds".to_string());
    out.push("    uint8_t packet[8];      // 8-byte input report".to_string());
    out.push("} EmbeddedMacroFrame_t;".to_string());
    out.push(String::new());

    if progmem {
        out.push("// Macro frames stored in program memory (PROGMEM)".to_string());
        out.push("const EmbeddedMacroFrame_t embedded_macro_frames[] PROGMEM = {".to_string());
    } else {
        out.push("// Macro frames stored in flash".to_string());
        out.push("static const EmbeddedMacroFrame_t embedded_macro_frames[] = {".to_string());
    }
    for (i, frame) in frames.frames().iter().enumerate() {
        let bytes = frame
            .packet
            .as_bytes()
            .iter()
            .map(|b| format!("0x{b:02X}"))
            .collect::<Vec<_>>()
            .join(", ");
        let comma = if i + 1 < count { "," } else { "" };
        out.push(format!("    {{ {}, {{ {bytes} }} }}{comma}", frame.timestamp_ms));
    }
    out.push("};".to_string());
    out.push(String::new());

    let copy = if progmem { "memcpy_P" } else { "memcpy" };
    out.push(format!(
        "#define MACRO_READ_FRAME(index, dest) {copy}(dest, &embedded_macro_frames[index], sizeof(EmbeddedMacroFrame_t))"
    ));
    out.push(String::new());
    out.push("#endif // EMBEDDED_MACRO_H".to_string());

    debug!(frames = count, platform = ?options.platform, "emitted c header");
    out.join("\n") + "\n"
}

pub fn emit_json(frames: &CompiledMacro) -> serde_json::Result<String> {
    serde_json::to_string_pretty(frames)
}

pub fn load_frames_json_from_path(path: impl AsRef<Path>) -> anyhow::Result<CompiledMacro> {
    let path = path.as_ref();
    let bytes =
        fs::read(path).with_context(|| format!("failed to read frames: {}", path.display()))?;
    let frames: CompiledMacro = serde_json::from_slice(&bytes)
        .with_context(|| format!("failed to parse frames json: {}", path.display()))?;
    Ok(frames)
}

pub fn load_frames_json_from_str(json: &str) -> anyhow::Result<CompiledMacro> {
    let frames: CompiledMacro = serde_json::from_str(json).context("failed to parse frames json")?;
    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use macro_schema::{Frame, Packet};

    fn sample() -> CompiledMacro {
        CompiledMacro::new(vec![
            Frame::new(0, Packet::from_bytes([0, 0x06, 8, 128, 128, 128, 128, 0])),
            Frame::neutral(100),
            Frame::neutral(1500),
        ])
        .unwrap()
    }

    #[test]
    fn avr_header_uses_progmem() {
        let h = emit_c_header(&sample(), &EmitOptions::default());
        assert!(h.contains("#include <avr/pgmspace.h>"));
        assert!(h.contains("#define EMBEDDED_MACRO_ENABLED 1"));
        assert!(h.contains("#define EMBEDDED_MACRO_LOOP 0"));
        assert!(h.contains("#define EMBEDDED_MACRO_FRAME_COUNT 3"));
        assert!(h.contains("// Macro duration: 1.50 seconds (3 frames)"));
        assert!(h.contains("embedded_macro_frames[] PROGMEM = {"));
        assert!(h.contains("    { 0, { 0x00, 0x06, 0x08, 0x80, 0x80, 0x80, 0x80, 0x00 } },\n"));
        assert!(h.contains("    { 1500, { 0x00, 0x00, 0x08, 0x80, 0x80, 0x80, 0x80, 0x00 } }\n};"));
        assert!(h.contains("memcpy_P(dest, &embedded_macro_frames[index]"));
        assert!(h.trim_end().ends_with("#endif // EMBEDDED_MACRO_H"));
    }

    #[test]
    fn flash_platforms_use_plain_const_table() {
        for platform in [Platform::Esp32s3, Platform::Pico] {
            let h = emit_c_header(
                &sample(),
                &EmitOptions {
                    looped: true,
                    platform,
                },
            );
            assert!(!h.contains("pgmspace"));
            assert!(!h.contains("PROGMEM ="));
            assert!(h.contains("#define EMBEDDED_MACRO_LOOP 1"));
            assert!(h.contains("static const EmbeddedMacroFrame_t embedded_macro_frames[] = {"));
            assert!(h.contains(" memcpy(dest, &embedded_macro_frames[index]"));
        }
    }

    #[test]
    fn json_output_loads_back() {
        let m = sample();
        let json = emit_json(&m).unwrap();
        assert_eq!(load_frames_json_from_str(&json).unwrap(), m);
    }

    #[test]
    fn loading_rejects_out_of_order_frames() {
        let json = r#"[{"timestamp_ms":5,"packet":[0,0,8,128,128,128,128,0]},
                      {"timestamp_ms":1,"packet":[0,0,8,128,128,128,128,0]}]"#;
        assert!(load_frames_json_from_str(json).is_err());
    }
}
