//! Interactive exploration session: dataset → record → analysis menu.

use std::fmt;
use std::io::{BufRead, Write};

use anyhow::Result;

use crate::analysis::{self, AnalysisReport, TextField};
use crate::atlas::MappingService;
use crate::console::Prompter;
use crate::explorer::{Explorer, NeighborTable};

/// Where the session currently waits for input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuState {
    /// Asking for a dataset id; retried until one loads.
    SelectDataset,
    /// Asking for a record id; retried until its neighborhood resolves.
    SelectRecord,
    /// Showing the analysis menu for the current neighbor table.
    AnalysisMenu,
    /// Session finished.
    Terminate,
}

/// Entries of the analysis menu, numbered as displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    /// 1. Meta description length within a range.
    MetaDescriptionLength,
    /// 2. Keyword occurrences in meta descriptions.
    KeywordInMetaDescription,
    /// 3. Keyword occurrences in titles.
    KeywordInTitle,
    /// 4. Title length within a range.
    TitleLength,
    /// 5. Duplicate titles.
    DuplicateTitles,
    /// 6. URL length within a range.
    UrlLength,
    /// 7. Query parameters per URL.
    UrlParameters,
    /// 8. Pick another record id.
    NewRecord,
    /// 9. Leave the program.
    Exit,
}

impl MenuChoice {
    /// All choices in menu order.
    pub const ALL: [MenuChoice; 9] = [
        Self::MetaDescriptionLength,
        Self::KeywordInMetaDescription,
        Self::KeywordInTitle,
        Self::TitleLength,
        Self::DuplicateTitles,
        Self::UrlLength,
        Self::UrlParameters,
        Self::NewRecord,
        Self::Exit,
    ];

    /// Parses the number typed at the menu prompt.
    pub fn parse(input: &str) -> Option<Self> {
        let index: usize = input.trim().parse().ok()?;
        Self::ALL.get(index.checked_sub(1)?).copied()
    }

    /// State the session moves to after this choice is handled.
    pub fn next_state(self) -> MenuState {
        match self {
            Self::NewRecord => MenuState::SelectRecord,
            Self::Exit => MenuState::Terminate,
            _ => MenuState::AnalysisMenu,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::MetaDescriptionLength => "Meta Description Length Analysis",
            Self::KeywordInMetaDescription => "Keyword in Meta Description Analysis",
            Self::KeywordInTitle => "Keyword in Title Analysis",
            Self::TitleLength => "Title Length Analysis",
            Self::DuplicateTitles => "Duplicate Title Analysis",
            Self::UrlLength => "URL Length Analysis",
            Self::UrlParameters => "Parameters in URL Analysis",
            Self::NewRecord => "Enter new record ID",
            Self::Exit => "Exit program",
        }
    }
}

impl fmt::Display for MenuChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let number = Self::ALL.iter().position(|c| c == self).unwrap_or(0) + 1;
        write!(f, "{}. {}", number, self.label())
    }
}

/// Drives one exploration session against a mapping service.
pub struct Session<'a, M: ?Sized, R, W> {
    service: &'a M,
    prompter: Prompter<R, W>,
}

impl<'a, M, R, W> Session<'a, M, R, W>
where
    M: MappingService + ?Sized,
    R: BufRead,
    W: Write,
{
    /// Creates a session that reads answers from `prompter`.
    pub fn new(service: &'a M, prompter: Prompter<R, W>) -> Self {
        Self { service, prompter }
    }

    /// Returns the prompter, e.g. to inspect a scripted transcript.
    pub fn into_prompter(self) -> Prompter<R, W> {
        self.prompter
    }

    /// Runs until the user picks "Exit". Fails only when the console itself fails.
    pub fn run(&mut self) -> Result<()> {
        let mut state = MenuState::SelectDataset;
        let mut explorer: Option<Explorer<'a, M>> = None;
        let mut table: Option<NeighborTable> = None;
        loop {
            tracing::trace!(?state, "menu transition");
            state = match state {
                MenuState::SelectDataset => {
                    explorer = Some(self.select_dataset()?);
                    MenuState::SelectRecord
                }
                MenuState::SelectRecord => match &explorer {
                    Some(explorer) => {
                        table = Some(self.select_record(explorer)?);
                        MenuState::AnalysisMenu
                    }
                    None => MenuState::SelectDataset,
                },
                MenuState::AnalysisMenu => match &table {
                    Some(table) => self.analysis_menu(table)?,
                    None => MenuState::SelectRecord,
                },
                MenuState::Terminate => return Ok(()),
            };
        }
    }

    fn select_dataset(&mut self) -> Result<Explorer<'a, M>> {
        loop {
            let id = self.prompter.ask("Enter the dataset ID from Nomic Atlas: ")?;
            match Explorer::open(self.service, &id) {
                Ok(explorer) => {
                    let dataset = explorer.dataset();
                    self.prompter.say(format!(
                        "Map {} of dataset '{}'",
                        dataset.map_id, dataset.name
                    ))?;
                    self.prompter
                        .say(format!("Successfully loaded dataset with ID: {}", dataset.id))?;
                    self.prompter.say("Loading analyses...")?;
                    return Ok(explorer);
                }
                Err(err) => {
                    tracing::warn!(error = %err, "dataset selection failed");
                    self.prompter.say(format!("Error: {err}. Please try again."))?;
                }
            }
        }
    }

    fn select_record(&mut self, explorer: &Explorer<'a, M>) -> Result<NeighborTable> {
        loop {
            let id = self.prompter.ask("Enter the record ID: ")?;
            match explorer.neighborhood(&id) {
                Ok(table) => {
                    self.prompter.say(format!(
                        "Loaded {} neighbors of record {}.",
                        table.rows().len(),
                        table.query_id()
                    ))?;
                    return Ok(table);
                }
                Err(err) => {
                    tracing::warn!(error = %err, "record selection failed");
                    self.prompter.say(format!("Error: {err}. Please try again."))?;
                }
            }
        }
    }

    fn analysis_menu(&mut self, table: &NeighborTable) -> Result<MenuState> {
        self.prompter.say("\nSelect analysis to perform:")?;
        for choice in MenuChoice::ALL {
            self.prompter.say(choice.to_string())?;
        }
        let answer = self.prompter.ask("Enter your choice (1-9): ")?;
        let Some(choice) = MenuChoice::parse(&answer) else {
            self.prompter
                .say("Invalid choice. Please enter a number between 1 and 9.")?;
            return Ok(MenuState::AnalysisMenu);
        };

        let report = match choice {
            MenuChoice::MetaDescriptionLength => {
                let range = self.prompter.ask_range("meta description")?;
                analysis::meta_description_length(table, range)
            }
            MenuChoice::KeywordInMetaDescription => self.keyword_report(
                table,
                TextField::MetaDescription,
                "Enter the keyword to search in the meta description: ",
            )?,
            MenuChoice::KeywordInTitle => self.keyword_report(
                table,
                TextField::Title,
                "Enter the keyword to search in the title: ",
            )?,
            MenuChoice::TitleLength => {
                let range = self.prompter.ask_range("title")?;
                analysis::title_length(table, range)
            }
            MenuChoice::DuplicateTitles => analysis::duplicate_titles(table),
            MenuChoice::UrlLength => {
                let range = self.prompter.ask_range("URL")?;
                analysis::url_length(table, range)
            }
            MenuChoice::UrlParameters => analysis::url_parameters(table),
            MenuChoice::NewRecord => {
                self.prompter.say("Returning to record selection.")?;
                return Ok(choice.next_state());
            }
            MenuChoice::Exit => {
                self.prompter.say("Exiting the program.")?;
                return Ok(choice.next_state());
            }
        };

        self.prompter.show_report(&report)?;
        self.prompter.pause()?;
        Ok(choice.next_state())
    }

    fn keyword_report(
        &mut self,
        table: &NeighborTable,
        field: TextField,
        label: &str,
    ) -> Result<AnalysisReport> {
        loop {
            let keyword = self.prompter.ask_non_empty(label)?;
            match analysis::keyword_occurrences(table, field, &keyword) {
                Ok(report) => return Ok(report),
                Err(err) => {
                    tracing::warn!(error = %err, len = keyword.len(), "keyword rejected");
                    self.prompter.say(format!("Error: {err}. Please try again."))?;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_menu_numbers() {
        assert_eq!(MenuChoice::parse("1"), Some(MenuChoice::MetaDescriptionLength));
        assert_eq!(MenuChoice::parse(" 9 "), Some(MenuChoice::Exit));
        assert_eq!(MenuChoice::parse("0"), None);
        assert_eq!(MenuChoice::parse("10"), None);
        assert_eq!(MenuChoice::parse("two"), None);
    }

    #[test]
    fn only_exit_terminates() {
        for choice in MenuChoice::ALL {
            let next = choice.next_state();
            assert_eq!(next == MenuState::Terminate, choice == MenuChoice::Exit);
        }
        assert_eq!(MenuChoice::NewRecord.next_state(), MenuState::SelectRecord);
        assert_eq!(MenuChoice::UrlLength.next_state(), MenuState::AnalysisMenu);
    }

    #[test]
    fn display_numbers_entries() {
        assert_eq!(MenuChoice::TitleLength.to_string(), "4. Title Length Analysis");
        assert_eq!(MenuChoice::Exit.to_string(), "9. Exit program");
    }
}
