//! Interactive menu loop.
//!
//! # Invariants
//! - A store failure in one action is printed and logged; the loop goes on.
//! - End of input ends the session like menu item `0`.
//! - Only I/O errors on the console itself stop the loop with an error.

use crate::input::{optional_age, optional_text, parse_number, AgeInput};
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::{self, BufRead, Write};
use std::str::FromStr;
use usersvc_core::{RepoError, UserId, UserPatch, UserRepository, UserService};

#[derive(Debug)]
pub enum CliError {
    Io(io::Error),
    Repo(RepoError),
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "console i/o failed: {err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CliError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<io::Error> for CliError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<RepoError> for CliError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

type ActionResult = Result<(), CliError>;

/// Menu-driven front end over any line source and sink.
pub struct Console<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Runs the menu until the operator exits or input ends.
    pub fn run<Repo: UserRepository>(&mut self, service: &UserService<Repo>) -> io::Result<()> {
        info!("event=cli_session module=cli status=start");
        loop {
            self.print_menu()?;
            let Some(choice) = self.read_number::<i64>("Select a menu item: ")? else {
                info!("event=cli_session module=cli status=ok reason=eof");
                return Ok(());
            };

            let outcome = match choice {
                1 => self.create_user(service),
                2 => self.find_user_by_id(service),
                3 => self.list_all_users(service),
                4 => self.update_user(service),
                5 => self.delete_user(service),
                0 => {
                    info!("event=cli_session module=cli status=ok reason=exit");
                    return Ok(());
                }
                _ => {
                    writeln!(self.output, "Unknown menu item")?;
                    continue;
                }
            };

            match outcome {
                Ok(()) => {}
                Err(CliError::Repo(err)) => {
                    error!("event=cli_action module=cli status=error choice={choice} error={err}");
                    writeln!(self.output, "Error: {err}")?;
                }
                Err(CliError::Io(err)) => return Err(err),
            }
        }
    }

    fn print_menu(&mut self) -> io::Result<()> {
        writeln!(self.output)?;
        writeln!(self.output, "==== USER SERVICE ====")?;
        writeln!(self.output, "1. Create user")?;
        writeln!(self.output, "2. Find user by id")?;
        writeln!(self.output, "3. List all users")?;
        writeln!(self.output, "4. Update user")?;
        writeln!(self.output, "5. Delete user")?;
        writeln!(self.output, "0. Exit")
    }

    fn create_user<Repo: UserRepository>(&mut self, service: &UserService<Repo>) -> ActionResult {
        writeln!(self.output, "--- Create user ---")?;
        let Some(name) = self.prompt("Name: ")? else {
            return Ok(());
        };
        let Some(email) = self.prompt("Email: ")? else {
            return Ok(());
        };
        let Some(age) = self.read_number::<i32>("Age: ")? else {
            return Ok(());
        };

        let user = service.create_user(name, email, age)?;
        match user.id {
            Some(id) => writeln!(self.output, "User created with id: {id}")?,
            None => writeln!(self.output, "User created")?,
        }
        Ok(())
    }

    fn find_user_by_id<Repo: UserRepository>(
        &mut self,
        service: &UserService<Repo>,
    ) -> ActionResult {
        writeln!(self.output, "--- Find user by id ---")?;
        let Some(id) = self.read_number::<UserId>("User id: ")? else {
            return Ok(());
        };

        match service.get_user_by_id(id)? {
            Some(user) => writeln!(self.output, "Found user: {user}")?,
            None => writeln!(self.output, "User with id {id} not found")?,
        }
        Ok(())
    }

    fn list_all_users<Repo: UserRepository>(
        &mut self,
        service: &UserService<Repo>,
    ) -> ActionResult {
        writeln!(self.output, "--- All users ---")?;
        let users = service.get_all_users()?;
        if users.is_empty() {
            writeln!(self.output, "No users found")?;
        }
        for user in users {
            writeln!(self.output, "{user}")?;
        }
        Ok(())
    }

    fn update_user<Repo: UserRepository>(&mut self, service: &UserService<Repo>) -> ActionResult {
        writeln!(self.output, "--- Update user ---")?;
        let Some(id) = self.read_number::<UserId>("User id to update: ")? else {
            return Ok(());
        };

        let Some(current) = service.get_user_by_id(id)? else {
            writeln!(self.output, "User with id {id} not found")?;
            return Ok(());
        };
        writeln!(self.output, "Current data: {current}")?;

        let Some(name) = self.prompt("New name (blank to keep): ")? else {
            return Ok(());
        };
        let Some(email) = self.prompt("New email (blank to keep): ")? else {
            return Ok(());
        };
        let Some(age) = self.prompt("New age (blank to keep): ")? else {
            return Ok(());
        };

        let age = match optional_age(&age) {
            AgeInput::Keep => None,
            AgeInput::Set(age) => Some(age),
            AgeInput::Invalid => {
                writeln!(self.output, "Age not changed: invalid number")?;
                None
            }
        };
        let patch = UserPatch {
            name: optional_text(&name),
            email: optional_text(&email),
            age,
        };

        match service.update_user(id, patch)? {
            Some(user) => writeln!(self.output, "User updated: {user}")?,
            None => writeln!(self.output, "Update was not performed")?,
        }
        Ok(())
    }

    fn delete_user<Repo: UserRepository>(&mut self, service: &UserService<Repo>) -> ActionResult {
        writeln!(self.output, "--- Delete user ---")?;
        let Some(id) = self.read_number::<UserId>("User id to delete: ")? else {
            return Ok(());
        };

        if service.delete_user(id)? {
            writeln!(self.output, "User deleted")?;
        } else {
            writeln!(self.output, "User with this id not found")?;
        }
        Ok(())
    }

    /// Prints `label` and reads one line without its line ending.
    /// `None` at end of input. Invalid UTF-8 is replaced, not rejected.
    fn prompt(&mut self, label: &str) -> io::Result<Option<String>> {
        write!(self.output, "{label}")?;
        self.output.flush()?;

        let mut raw = Vec::new();
        if self.input.read_until(b'\n', &mut raw)? == 0 {
            return Ok(None);
        }
        let line = String::from_utf8_lossy(&raw);
        Ok(Some(line.trim_end_matches(['\n', '\r']).to_string()))
    }

    /// Re-prompts until the line parses as a number. `None` at end of input.
    fn read_number<T: FromStr>(&mut self, label: &str) -> io::Result<Option<T>> {
        loop {
            let Some(line) = self.prompt(label)? else {
                return Ok(None);
            };
            if let Some(value) = parse_number(&line) {
                return Ok(Some(value));
            }
            writeln!(self.output, "Please enter an integer")?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Console;
    use std::io::Cursor;
    use usersvc_core::db::open_db_in_memory;
    use usersvc_core::{SqliteUserRepository, UserService};

    /// Runs `script` against a fresh in-memory store prepared with `setup_sql`.
    fn run_script(setup_sql: &str, script: &str) -> String {
        let conn = open_db_in_memory().unwrap();
        if !setup_sql.is_empty() {
            conn.execute_batch(setup_sql).unwrap();
        }
        let service = UserService::new(SqliteUserRepository::try_new(&conn).unwrap());
        let mut output = Vec::new();
        Console::new(Cursor::new(script.as_bytes()), &mut output)
            .run(&service)
            .unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn create_then_find_prints_user() {
        let output = run_script("", "1\nAlice\nalice@example.com\n25\n2\n1\n0\n");

        assert!(output.contains("User created with id: 1"));
        assert!(output.contains(
            "Found user: User{id=1, name='Alice', email='alice@example.com', age=25}"
        ));
    }

    #[test]
    fn non_numeric_input_is_reprompted() {
        let output = run_script("", "abc\n1\nBob\nbob@example.com\nold\n30\n0\n");

        assert_eq!(output.matches("Please enter an integer").count(), 2);
        assert!(output.contains("User created with id: 1"));
    }

    #[test]
    fn list_reports_empty_store_and_then_rows() {
        let output = run_script("", "3\n1\nA\na@example.com\n20\n3\n0\n");

        assert!(output.contains("No users found"));
        assert!(output.contains("User{id=1, name='A', email='a@example.com', age=20}"));
    }

    #[test]
    fn update_with_blank_fields_keeps_current_values() {
        let script = "1\nAlice\nalice@example.com\n25\n4\n1\n\nnew@example.com\n\n0\n";
        let output = run_script("", script);

        assert!(output.contains(
            "Current data: User{id=1, name='Alice', email='alice@example.com', age=25}"
        ));
        assert!(output.contains(
            "User updated: User{id=1, name='Alice', email='new@example.com', age=25}"
        ));
    }

    #[test]
    fn update_with_invalid_age_keeps_age() {
        let script = "1\nAlice\nalice@example.com\n25\n4\n1\nAli\n\nlots\n0\n";
        let output = run_script("", script);

        assert!(output.contains("Age not changed: invalid number"));
        assert!(output.contains(
            "User updated: User{id=1, name='Ali', email='alice@example.com', age=25}"
        ));
    }

    #[test]
    fn update_of_missing_user_reports_not_found() {
        let output = run_script("", "4\n9\n0\n");
        assert!(output.contains("User with id 9 not found"));
    }

    #[test]
    fn delete_reports_result_of_existence_check() {
        let script = "1\nAlice\nalice@example.com\n25\n5\n1\n5\n1\n2\n1\n0\n";
        let output = run_script("", script);

        assert!(output.contains("User deleted"));
        assert!(output.contains("User with this id not found"));
        assert!(output.contains("User with id 1 not found"));
    }

    #[test]
    fn unknown_choice_is_reported() {
        let output = run_script("", "7\n0\n");
        assert!(output.contains("Unknown menu item"));
    }

    #[test]
    fn store_failure_is_reported_and_session_continues() {
        let setup = "CREATE TRIGGER users_reject_all
                     BEFORE INSERT ON users
                     BEGIN
                         SELECT RAISE(ABORT, 'inserts disabled');
                     END;";
        let output = run_script(setup, "1\nAlice\nalice@example.com\n25\n3\n0\n");

        assert!(output.contains("Error: inserts disabled"));
        assert!(output.contains("No users found"));
    }

    #[test]
    fn invalid_utf8_line_does_not_end_session() {
        let mut script = b"1\nAl".to_vec();
        script.push(0xff);
        script.extend_from_slice(b"\nalice@example.com\n25\n3\n0\n");

        let conn = open_db_in_memory().unwrap();
        let service = UserService::new(SqliteUserRepository::try_new(&conn).unwrap());
        let mut output = Vec::new();
        Console::new(Cursor::new(script), &mut output)
            .run(&service)
            .unwrap();
        let output = String::from_utf8(output).unwrap();

        assert!(output.contains("User created with id: 1"));
        assert!(output.contains("name='Al\u{fffd}'"));
        assert_eq!(service.get_all_users().unwrap().len(), 1);
    }

    #[test]
    fn end_of_input_ends_session() {
        let output = run_script("", "1\nAlice\n");

        assert!(!output.contains("User created"));
        assert!(output.ends_with("Select a menu item: "));
    }
}
