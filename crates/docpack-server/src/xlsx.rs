//! Spreadsheet export of a story backlog. The writer itself is an opaque
//! rows-to-bytes capability.

use docpack_core::backlog::BacklogStory;
use rust_xlsxwriter::{Format, Workbook, XlsxError};

const HEADERS: [&str; 6] = [
    "Epic",
    "Summary",
    "User Story",
    "Acceptance Criteria",
    "Priority",
    "Story Points",
];

/// Render stories as a single-sheet workbook.
pub fn stories_workbook(stories: &[BacklogStory]) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("User Stories")?;

    let bold = Format::new().set_bold();
    for (col, header) in HEADERS.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *header, &bold)?;
    }

    for (i, story) in stories.iter().enumerate() {
        let row = (i + 1) as u32;
        sheet.write_string(row, 0, &story.epic_name)?;
        sheet.write_string(row, 1, &story.summary)?;
        sheet.write_string(row, 2, &story.story)?;
        sheet.write_string(row, 3, story.acceptance_criteria.join("\n"))?;
        sheet.write_string(row, 4, story.priority.to_string())?;
        sheet.write_number(row, 5, f64::from(story.story_points))?;
    }

    sheet.set_column_width(1, 40)?;
    sheet.set_column_width(2, 60)?;
    sheet.set_column_width(3, 60)?;

    workbook.save_to_buffer()
}
