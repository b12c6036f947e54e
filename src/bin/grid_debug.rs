// Grid Debug Binary - For exercising the addressing engine in isolation
// Run with: cargo run --bin grid-debug

fn main() {
    use slotgrid::columns::{ColumnSet, GridColumn};
    use slotgrid::slots::{GroupSpec, SlotSpace};

    let log_buffer = slotgrid::logging::init_tracing();

    println!("=== Grid Addressing Debug ===\n");

    // Column ordering walkthrough
    let mut columns = ColumnSet::new();
    for (name, width) in [("id", 6), ("name", 20), ("amount", 10), ("status", 8)] {
        columns.push_column(GridColumn::new(name).with_width(width), None);
    }
    println!("Initial display order: {:?}", columns.display_ordered_names());

    let changes = columns.push_column(GridColumn::new("region").with_width(12), Some(1));
    println!("Inserted 'region' at display 1:");
    println!("  display order: {:?}", columns.display_ordered_names());
    for change in &changes {
        println!(
            "  moved: {} -> display {}",
            change.name, change.display_index
        );
    }

    // Frozen partitioning
    let layout = columns.recompute_frozen(2, 1, 180);
    println!("\nFrozen state (left=2, right=1):");
    println!("  placements: {:?}", columns.frozen_positions());
    println!(
        "  left width {} -> {}, offset corrected to {}",
        layout.left_width_before, layout.left_width_after, layout.corrected_offset
    );

    // Grouped slot space walkthrough
    let mut slots = SlotSpace::new();
    slots.bind_groups(
        vec![
            GroupSpec::parent(
                "region",
                vec![
                    GroupSpec::leaf("east", 0..3),
                    GroupSpec::leaf("west", 3..5),
                ],
            ),
            GroupSpec::leaf("unassigned", 5..8),
        ],
        8,
    );
    println!("\nGrouped space: {} slots for 8 rows", slots.slot_count());
    for slot in 0..slots.slot_count() {
        println!("  slot {:2} -> {:?}", slot, slots.classify_slot(slot));
    }

    let result = slots.toggle_at_slot(1, false);
    println!(
        "\nToggled slot 1 ({}), delta {}, {} slots remain",
        result.description,
        result.slots_delta,
        slots.slot_count()
    );

    let result = slots.toggle_at_slot(0, true);
    println!(
        "Toggled slot 0 subtree ({}), {} slots remain",
        result.description,
        slots.slot_count()
    );

    println!("\nRecent engine logs:");
    for entry in log_buffer.get_recent(10) {
        println!("  {}", entry.format_for_display());
    }
}
