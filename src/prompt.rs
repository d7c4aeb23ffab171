use std::io;
use std::io::{BufRead, Write};

/// Yes/no question on the terminal. `None` means the user aborted input
/// (EOF); aborting is not an error.
pub fn confirm(question: &str) -> io::Result<Option<bool>> {
    print!("{} [j/N] ", question);
    io::stdout().flush()?;
    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(parse_answer(&line)))
}

fn parse_answer(line: &str) -> bool {
    matches!(
        line.trim().to_lowercase().as_str(),
        "j" | "ja" | "y" | "yes"
    )
}
