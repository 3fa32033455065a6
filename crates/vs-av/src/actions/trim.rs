//! Lossless trim using ffmpeg `-c copy`.

/// Arguments that copy `[start, start + length)` of `input` into `output`
/// without re-encoding.
///
/// `-ss` is an output option here, so the cut is exact to the packet rather
/// than snapped to the preceding keyframe of the input. A `length` reaching
/// past the end of the input is fine: ffmpeg copies until end-of-stream, so
/// the last segment of a split comes out shorter than the nominal slice.
pub fn trim_args(input: &str, start_second: u64, length_second: u64, output: &str) -> Vec<String> {
    vec![
        "-y".into(),
        "-i".into(),
        input.into(),
        "-ss".into(),
        start_second.to_string(),
        "-t".into(),
        length_second.to_string(),
        "-c".into(),
        "copy".into(),
        output.into(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_segment_args() {
        assert_eq!(
            trim_args("input.mp4", 0, 60, "output_1.mp4"),
            vec!["-y", "-i", "input.mp4", "-ss", "0", "-t", "60", "-c", "copy", "output_1.mp4"]
        );
    }

    #[test]
    fn later_segment_keeps_nominal_length() {
        let args = trim_args("input.mp4", 120, 60, "output_3.mp4");
        let ss = args.iter().position(|a| a == "-ss").unwrap();
        assert_eq!(args[ss + 1], "120");
        let t = args.iter().position(|a| a == "-t").unwrap();
        assert_eq!(args[t + 1], "60");
        assert_eq!(args.last().unwrap(), "output_3.mp4");
    }
}
