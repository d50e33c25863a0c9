use anyhow::Result;
use clap::Parser;
use log::{debug, info, warn};
use midi_timeline::{Args, TimelineAssembler, import_midi_file, summarize, write_timeline};

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let config = args.conversion_config();

    info!("Importing MIDI file: '{}'...", args.midi.display());
    let stream = import_midi_file(&args.midi)?;
    debug!(
        "Decoded {} events at {} ticks per beat..!",
        stream.events.len(),
        stream.ticks_per_beat
    );

    let timeline = TimelineAssembler::new(config).assemble(&stream)?;

    if timeline.dropped_note_offs > 0 {
        warn!(
            "Dropped {} note-off event(s) with no matching note-on..!",
            timeline.dropped_note_offs
        );
    }
    if timeline.unclosed_notes > 0 {
        warn!(
            "Dropped {} note-on event(s) that were never released..!",
            timeline.unclosed_notes
        );
    }

    if args.dry_run {
        for line in summarize(&timeline, args.dry_run_max) {
            info!("{}", line);
        }
        return Ok(());
    }

    write_timeline(&timeline, &args.output, args.pretty)?;
    Ok(())
}
