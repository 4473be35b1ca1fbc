//! Control-store image for the interpretive simulator.
//!
//! One line per program, holding that program's words in step order. The
//! simulator addresses a step as (program base, local offset), so lines
//! follow programs rather than global addresses.

use crate::{
    allocator::Allocation,
    ds::{ControlWord, EncodedProgram},
    error::ParseError,
};

/// Renders the image. When `annotations` is given, each line ends with a
/// `// name @ base` comment that `$readmemh` and [`decode`] both skip.
pub(crate) fn emit(programs: &[EncodedProgram], annotations: Option<&Allocation>) -> String {
    let mut image = String::new();
    for (index, program) in programs.iter().enumerate() {
        let words: Vec<String> = program.words.iter().map(ControlWord::to_string).collect();
        image.push_str(&words.join(" "));
        if let Some(placement) = annotations.and_then(|a| a.placements.get(index)) {
            image.push_str(&format!(" // {} @ {}", placement.name, placement.base));
        }
        image.push('\n');
    }
    image
}

/// Reads an image back into per-program word lists.
pub(crate) fn decode(image: &str) -> Result<Vec<Vec<ControlWord>>, ParseError> {
    image
        .lines()
        .enumerate()
        .map(|(index, line)| {
            let line = line.split("//").next().unwrap_or_default();
            line.split_whitespace()
                .map(|word| {
                    if word.len() != 8 {
                        return Err(ParseError::new(
                            index + 1,
                            &format!("Word '{}' is not 8 hex digits", word),
                        ));
                    }
                    u32::from_str_radix(word, 16).map(ControlWord).map_err(|_| {
                        ParseError::new(index + 1, &format!("Invalid hex word '{}'", word))
                    })
                })
                .collect::<Result<Vec<_>, _>>()
        })
        .collect()
}
