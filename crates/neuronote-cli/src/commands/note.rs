use clap::Subcommand;
use neuronote_core::Database;

#[derive(Subcommand)]
pub enum NoteAction {
    /// Create a note
    Add {
        content: String,
        #[arg(long, default_value = "")]
        summary: String,
    },
    /// Attach a quiz card to a note
    AddCard {
        note_id: String,
        #[arg(long)]
        question: String,
        #[arg(long)]
        answer: String,
    },
    /// Show a note with its quiz cards
    Get { id: String },
    /// List all notes
    List,
}

pub fn run(action: NoteAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    match action {
        NoteAction::Add { content, summary } => {
            let note = db.insert_note(&content, &summary)?;
            println!("{}", serde_json::to_string_pretty(&note)?);
        }
        NoteAction::AddCard {
            note_id,
            question,
            answer,
        } => {
            if db.get_note(&note_id)?.is_none() {
                return Err(format!("note not found: {note_id}").into());
            }
            let card = db.insert_quiz_card(&note_id, &question, &answer)?;
            println!("{}", serde_json::to_string_pretty(&card)?);
        }
        NoteAction::Get { id } => match db.get_note(&id)? {
            Some(note) => println!("{}", serde_json::to_string_pretty(&note)?),
            None => return Err(format!("note not found: {id}").into()),
        },
        NoteAction::List => {
            let notes = db.list_notes()?;
            println!("{}", serde_json::to_string_pretty(&notes)?);
        }
    }
    Ok(())
}
