//! Line commands understood by the terminal viewer.

use glam::Vec3;
use shared::domain::VisualId;

pub const HELP: &str = "\
commands:
  add              start placing a note marker
  click X Y Z      click the panorama along direction (X, Y, Z)
  stop             stop recording and transcribe
  cancel           abandon placement or recording
  next | prev      switch panorama
  hover N          point at marker visual #N
  leave N          move the pointer off marker visual #N
  list             show markers on the current panorama
  help             show this text
  quit             exit";

#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Add,
    Click(Vec3),
    Stop,
    Cancel,
    Advance(i64),
    Hover(VisualId),
    Leave(VisualId),
    List,
    Help,
    Quit,
}

pub fn parse_line(line: &str) -> Result<Option<Input>, String> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = words.collect();
    let input = match (verb.to_ascii_lowercase().as_str(), args.as_slice()) {
        ("add", []) => Input::Add,
        ("click", [x, y, z]) => Input::Click(Vec3::new(number(x)?, number(y)?, number(z)?)),
        ("stop", []) => Input::Stop,
        ("cancel", []) => Input::Cancel,
        ("next", []) => Input::Advance(1),
        ("prev", []) => Input::Advance(-1),
        ("hover", [id]) => Input::Hover(visual(id)?),
        ("leave", [id]) => Input::Leave(visual(id)?),
        ("list", []) => Input::List,
        ("help", []) => Input::Help,
        ("quit" | "exit", []) => Input::Quit,
        (verb, _) => return Err(format!("unrecognised command `{verb}`; try `help`")),
    };
    Ok(Some(input))
}

fn number(word: &str) -> Result<f32, String> {
    word.parse()
        .map_err(|_| format!("`{word}` is not a number"))
}

fn visual(word: &str) -> Result<VisualId, String> {
    word.trim_start_matches('#')
        .parse()
        .map(VisualId)
        .map_err(|_| format!("`{word}` is not a marker id"))
}
