//! Statistics reporting.

use console::style;

use crate::download::StatsSnapshot;

/// Print the end-of-run statistics table.
pub fn print_run_stats(snapshot: &StatsSnapshot) {
    println!();
    println!("{}", style("═".repeat(50)).dim());
    println!("{}", style("Download Statistics:").bold());
    println!("  Items total:     {}", snapshot.items_total);
    println!(
        "  Items succeeded: {}",
        style(snapshot.items_succeeded).green()
    );
    if snapshot.items_failed > 0 {
        println!("  Items failed:    {}", style(snapshot.items_failed).red());
    } else {
        println!("  Items failed:    0");
    }
    println!(
        "  Items skipped:   {} (already acquired or filtered)",
        style(snapshot.items_skipped).yellow()
    );
    println!("  Success rate:    {:.1}%", snapshot.success_rate());
    println!();
    println!("  Videos:  {}", snapshot.videos);
    println!("  Images:  {}", snapshot.images);
    println!("  Audio:   {}", snapshot.audio);
    println!("  Covers:  {}", snapshot.covers);
    println!("  Avatars: {}", snapshot.avatars);
    if snapshot.assets_skipped > 0 {
        println!("  Assets skipped (already on disk): {}", snapshot.assets_skipped);
    }
    if snapshot.optional_failed > 0 {
        println!(
            "  Optional assets failed: {}",
            style(snapshot.optional_failed).yellow()
        );
    }
    println!("  Elapsed: {:.1}s", snapshot.elapsed_secs);
    println!("{}", style("═".repeat(50)).dim());
}
