use macro_compiler::{button_names, dpad_name};
use macro_schema::{CompiledMacro, Frame, Milliseconds};

pub fn print_timeline(frames: &CompiledMacro, looped: bool, at: Option<Milliseconds>) {
    println!(
        "Macro: {} frames, {} ms total ({})",
        frames.len(),
        frames.total_duration_ms(),
        if looped { "loops" } else { "plays once" }
    );
    println!("Time(ms) | Buttons              | DPad      | LX  LY  | RX  RY");
    println!("---------|----------------------|-----------|---------|--------");

    for frame in frames.frames() {
        println!("{}", format_row(frame));
    }

    if let Some(t) = at {
        let active = frames.frame_at(t, looped);
        println!();
        println!("At {t} ms: frame @{} ms", active.timestamp_ms);
        println!("{}", format_row(active));
    }
}

pub fn format_row(frame: &Frame) -> String {
    let p = &frame.packet;
    let names = button_names(p.buttons());
    let buttons = if names.is_empty() {
        "-".to_string()
    } else {
        names.join("+")
    };
    let dpad = dpad_name(p.dpad())
        .map(str::to_string)
        .unwrap_or_else(|| format!("?{}", p.dpad()));
    let (lx, ly) = p.left_stick();
    let (rx, ry) = p.right_stick();
    format!(
        "{:8} | {:20} | {:9} | {:3} {:3} | {:3} {:3}",
        frame.timestamp_ms, buttons, dpad, lx, ly, rx, ry
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use macro_schema::Packet;

    #[test]
    fn row_shows_decoded_fields() {
        let frame = Frame::new(100, Packet::from_parts(0b110, 3, (0, 255), (128, 128)));
        let row = format_row(&frame);
        assert_eq!(row, "     100 | B+A                  | DOWNRIGHT |   0 255 | 128 128");
    }

    #[test]
    fn neutral_row_has_placeholder_buttons() {
        let row = format_row(&Frame::neutral(0));
        assert!(row.contains("| -  "));
        assert!(row.contains("CENTER"));
    }
}
