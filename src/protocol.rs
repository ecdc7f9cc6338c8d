use std::io::{self, BufRead};
use std::str::FromStr;

use crate::grid::{invalid_data, Grid};
use crate::types::{Command, Item, Team, TurnObservation, Unit, Vec2};

/// Reads one line without its terminator. `None` means the stream is exhausted.
fn next_line<R: BufRead>(reader: &mut R) -> io::Result<Option<String>> {
    let mut line = String::new();
    if reader.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    while line.ends_with('\n') || line.ends_with('\r') {
        line.pop();
    }
    Ok(Some(line))
}

/// Next line that carries at least one token.
fn next_record<R: BufRead>(reader: &mut R) -> io::Result<Option<String>> {
    while let Some(line) = next_line(reader)? {
        if !line.trim().is_empty() {
            return Ok(Some(line));
        }
    }
    Ok(None)
}

fn require_record<R: BufRead>(reader: &mut R, what: &str) -> io::Result<String> {
    next_record(reader)?.ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("input ended while reading {what}"),
        )
    })
}

fn parse_field<'a, T, I>(fields: &mut I, name: &str, line: &str) -> io::Result<T>
where
    T: FromStr,
    I: Iterator<Item = &'a str>,
{
    let raw = fields
        .next()
        .ok_or_else(|| invalid_data(format!("missing {name} in {line:?}")))?;
    raw.parse::<T>()
        .map_err(|_| invalid_data(format!("invalid {name} {raw:?} in {line:?}")))
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw {
        "0" | "false" => Some(false),
        "1" | "true" => Some(true),
        _ => None,
    }
}

pub fn parse_unit(line: &str) -> io::Result<Unit> {
    let mut fields = line.split_whitespace();
    let id = parse_field(&mut fields, "pac id", line)?;
    let mine_raw: String = parse_field(&mut fields, "mine flag", line)?;
    let mine = parse_flag(&mine_raw)
        .ok_or_else(|| invalid_data(format!("invalid mine flag {mine_raw:?} in {line:?}")))?;
    let x = parse_field(&mut fields, "x", line)?;
    let y = parse_field(&mut fields, "y", line)?;
    let type_id = parse_field(&mut fields, "type id", line)?;
    let speed_turns_left = parse_field(&mut fields, "speed turns left", line)?;
    let ability_cooldown = parse_field(&mut fields, "ability cooldown", line)?;
    Ok(Unit {
        id,
        pos: Vec2::new(x, y),
        team: if mine { Team::Mine } else { Team::Enemy },
        type_id,
        speed_turns_left,
        ability_cooldown,
    })
}

pub fn parse_item(line: &str) -> io::Result<Item> {
    let mut fields = line.split_whitespace();
    let x = parse_field(&mut fields, "x", line)?;
    let y = parse_field(&mut fields, "y", line)?;
    let value = parse_field(&mut fields, "value", line)?;
    Ok(Item {
        pos: Vec2::new(x, y),
        value,
    })
}

fn parse_count(line: &str, what: &str) -> io::Result<usize> {
    let mut fields = line.split_whitespace();
    parse_field(&mut fields, what, line)
}

/// Startup block: `width height` followed by `height` raw rows. Rows are taken
/// verbatim because leading and trailing spaces are floor.
pub fn read_startup<R: BufRead>(reader: &mut R) -> io::Result<Grid> {
    let header = require_record(reader, "grid size")?;
    let mut fields = header.split_whitespace();
    let width: i32 = parse_field(&mut fields, "width", &header)?;
    let height: i32 = parse_field(&mut fields, "height", &header)?;
    if width <= 0 || height <= 0 {
        return Err(invalid_data(format!("grid size must be positive: {header:?}")));
    }

    let mut rows = Vec::new();
    for y in 0..height {
        let row = next_line(reader)?.ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("input ended at grid row {y}"),
            )
        })?;
        rows.push(row);
    }
    Grid::load(width, height, &rows)
}

/// One turn of input. `Ok(None)` only when the stream ends cleanly before the turn
/// starts; running out in the middle of a turn is an error.
pub fn read_turn<R: BufRead>(reader: &mut R) -> io::Result<Option<TurnObservation>> {
    let Some(header) = next_record(reader)? else {
        return Ok(None);
    };
    let mut fields = header.split_whitespace();
    let my_score = parse_field(&mut fields, "my score", &header)?;
    let opponent_score = parse_field(&mut fields, "opponent score", &header)?;

    let unit_count = parse_count(&require_record(reader, "visible pac count")?, "pac count")?;
    let mut units = Vec::new();
    for _ in 0..unit_count {
        units.push(parse_unit(&require_record(reader, "pac record")?)?);
    }

    let item_count = parse_count(
        &require_record(reader, "visible pellet count")?,
        "pellet count",
    )?;
    let mut items = Vec::new();
    for _ in 0..item_count {
        items.push(parse_item(&require_record(reader, "pellet record")?)?);
    }

    Ok(Some(TurnObservation {
        my_score,
        opponent_score,
        units,
        items,
    }))
}

pub fn format_commands(commands: &[Command]) -> String {
    commands
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("|")
}

/// Inverse of `read_turn`, used by the simulator to drive the agent through the
/// same parser the live referee does.
pub fn write_turn(observation: &TurnObservation) -> String {
    let mut out = format!(
        "{} {}\n{}\n",
        observation.my_score,
        observation.opponent_score,
        observation.units.len()
    );
    for unit in &observation.units {
        out.push_str(&format!(
            "{} {} {} {} {} {} {}\n",
            unit.id,
            u8::from(unit.team == Team::Mine),
            unit.pos.x,
            unit.pos.y,
            unit.type_id,
            unit.speed_turns_left,
            unit.ability_cooldown
        ));
    }
    out.push_str(&format!("{}\n", observation.items.len()));
    for item in &observation.items {
        out.push_str(&format!("{} {} {}\n", item.pos.x, item.pos.y, item.value));
    }
    out
}

pub fn write_startup(grid: &Grid) -> String {
    let mut out = format!("{} {}\n", grid.width(), grid.height());
    for row in grid.layout_rows() {
        out.push_str(&row);
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn startup_keeps_leading_and_trailing_floor() {
        let input = "5 3\n#####\n  #  \n#####\n";
        let grid = read_startup(&mut input.as_bytes()).expect("startup should parse");
        assert_eq!(grid.width(), 5);
        assert_eq!(grid.height(), 3);
        assert!(grid.is_passable(Vec2::new(0, 1)));
        assert!(grid.is_passable(Vec2::new(4, 1)));
        assert!(grid.is_wall(Vec2::new(2, 1)));
    }

    #[test]
    fn startup_handles_crlf_rows() {
        let input = "3 2\r\n###\r\n# #\r\n";
        let grid = read_startup(&mut input.as_bytes()).expect("startup should parse");
        assert!(grid.is_passable(Vec2::new(1, 1)));
        assert!(grid.is_wall(Vec2::new(2, 1)));
    }

    #[test]
    fn startup_rejects_truncated_grid() {
        let input = "5 3\n#####\n";
        let err = read_startup(&mut input.as_bytes()).expect_err("grid is incomplete");
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn turn_parses_units_and_items() {
        let input = "12 7\n2\n0 1 3 1 ROCK 0 0\n1 0 5 1 PAPER 2 6\n2\n4 1 1\n9 1 10\n";
        let turn = read_turn(&mut input.as_bytes())
            .expect("turn should parse")
            .expect("turn should be present");
        assert_eq!(turn.my_score, 12);
        assert_eq!(turn.opponent_score, 7);
        assert_eq!(turn.units.len(), 2);
        assert_eq!(turn.units[0].team, Team::Mine);
        assert!(turn.units[0].is_ability_ready());
        assert_eq!(turn.units[1].team, Team::Enemy);
        assert_eq!(turn.units[1].type_id, "PAPER");
        assert_eq!(turn.units[1].ability_cooldown, 6);
        assert_eq!(turn.items[1].pos, Vec2::new(9, 1));
        assert_eq!(turn.items[1].value, 10);
    }

    #[test]
    fn clean_end_of_input_yields_none() {
        assert!(read_turn(&mut "".as_bytes()).expect("eof is clean").is_none());
        assert!(read_turn(&mut "\n\n".as_bytes())
            .expect("blank tail is clean")
            .is_none());
    }

    #[test]
    fn truncated_turn_is_an_error() {
        let err = read_turn(&mut "0 0\n2\n0 1 3 1 ROCK 0 0\n".as_bytes())
            .expect_err("second pac is missing");
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn huge_counts_fail_as_truncated_input_instead_of_allocating() {
        let err = read_turn(&mut "0 0\n18446744073709551615\n".as_bytes())
            .expect_err("no pac records follow");
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
        let err = read_turn(&mut "0 0\n0\n18446744073709551615\n".as_bytes())
            .expect_err("no pellet records follow");
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
        let err = read_turn(&mut "0 0\n184467440737095516150\n".as_bytes())
            .expect_err("count does not fit");
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn startup_rejects_grid_too_large_to_hold() {
        let err = read_startup(&mut "2147483647 2\n#\n#\n".as_bytes())
            .expect_err("area overflows");
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn malformed_record_is_invalid_data() {
        let err = parse_unit("0 maybe 3 1 ROCK 0 0").expect_err("flag is not boolean");
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        let err = parse_item("4 x 1").expect_err("y is not a number");
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn consecutive_turns_read_from_one_stream() {
        let input = "0 0\n0\n0\n1 2\n0\n1\n3 4 1\n";
        let mut reader = input.as_bytes();
        let first = read_turn(&mut reader).expect("first turn").expect("present");
        let second = read_turn(&mut reader).expect("second turn").expect("present");
        assert!(first.units.is_empty());
        assert_eq!(second.my_score, 1);
        assert_eq!(second.items.len(), 1);
        assert!(read_turn(&mut reader).expect("eof").is_none());
    }

    #[test]
    fn write_turn_is_read_back_unchanged() {
        let input = "3 4\n1\n2 1 6 1 SCISSORS 0 3\n1\n7 1 10\n";
        let turn = read_turn(&mut input.as_bytes())
            .expect("turn should parse")
            .expect("present");
        assert_eq!(write_turn(&turn), input);
    }

    #[test]
    fn commands_join_with_pipes() {
        let line = format_commands(&[
            Command::Move {
                unit_id: 0,
                x: 1,
                y: 2,
            },
            Command::Speed { unit_id: 1 },
        ]);
        assert_eq!(line, "MOVE 0 1 2|SPEED 1");
        assert_eq!(format_commands(&[]), "");
    }
}
