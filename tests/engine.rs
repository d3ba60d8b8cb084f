use image::Rgba;
use pixelsmith::canvas::TRANSPARENT;
use pixelsmith::components::history::Action;
use pixelsmith::components::tools::{PointerButton, SelectionMode, Tool};
use pixelsmith::ops::transform::resample_nearest;
use pixelsmith::settings::EngineSettings;
use pixelsmith::{Color, EditorState, GridSize, PixelBuffer, Point, Rect};
use pretty_assertions::assert_eq;

const BLACK: Color = Rgba([0, 0, 0, 255]);
const WHITE: Color = Rgba([255, 255, 255, 255]);
const RED: Color = Rgba([255, 0, 0, 255]);
const BLUE: Color = Rgba([0, 0, 255, 255]);

fn editor(w: u32, h: u32) -> EditorState {
    EditorState::from_buffer(PixelBuffer::new(GridSize::new(w, h)))
}

fn bordered_5x5() -> EditorState {
    let mut buf = PixelBuffer::new(GridSize::new(5, 5));
    buf.fill(WHITE);
    for i in 0..5 {
        buf.set_color(i, 0, BLACK);
        buf.set_color(i, 4, BLACK);
        buf.set_color(0, i, BLACK);
        buf.set_color(4, i, BLACK);
    }
    EditorState::from_buffer(buf)
}

/// Undo then redo of the most recent action must land on the exact before
/// and after buffers.
fn assert_inverse(ed: &mut EditorState, before: &PixelBuffer) {
    let after = ed.buffer().clone();
    assert!(ed.undo().is_some());
    assert_eq!(ed.buffer(), before);
    assert!(ed.redo().is_some());
    assert_eq!(ed.buffer(), &after);
}

#[test]
fn end_to_end_draw_undo_redo() {
    let mut ed = editor(4, 4);
    ed.set_primary_color(BLACK);
    ed.set_brush_size(1);
    ed.draw(Point::new(0, 0), BLACK);
    ed.end_stroke();
    assert_eq!(ed.get_color(0, 0), BLACK);
    assert_eq!(ed.history().undo_count(), 1);

    ed.undo();
    assert_eq!(ed.get_color(0, 0), TRANSPARENT);
    assert_eq!(ed.history().undo_count(), 0);
    assert_eq!(ed.history().redo_count(), 1);

    ed.redo();
    assert_eq!(ed.get_color(0, 0), BLACK);
}

#[test]
fn stroke_undoes_atomically() {
    let mut ed = editor(5, 3);
    ed.pointer_down(Point::new(1, 1), PointerButton::Primary);
    ed.pointer_move(Point::new(2, 1));
    ed.pointer_move(Point::new(3, 1));
    ed.pointer_up();
    assert_eq!(ed.history().undo_count(), 1);
    for x in 1..=3 {
        assert_eq!(ed.get_color(x, 1), BLACK);
    }
    ed.undo();
    assert_eq!(ed.buffer(), &PixelBuffer::new(GridSize::new(5, 3)));
}

#[test]
fn history_is_bounded() {
    let settings = EngineSettings {
        max_history_size: 5,
        default_grid_width: 8,
        default_grid_height: 1,
        ..EngineSettings::default()
    };
    let mut ed = EditorState::with_settings(settings);
    for x in 0..8 {
        ed.draw(Point::new(x, 0), RED);
        ed.end_stroke();
    }
    assert_eq!(ed.history().undo_count(), 5);
    while ed.undo().is_some() {}
    // The three oldest strokes were evicted and can no longer be undone.
    for x in 0..3 {
        assert_eq!(ed.get_color(x, 0), RED);
    }
    for x in 3..8 {
        assert_eq!(ed.get_color(x, 0), TRANSPARENT);
    }
}

#[test]
fn default_history_cap_is_one_hundred() {
    let mut ed = editor(1, 1);
    for i in 0..150u32 {
        let c = Rgba([(i % 256) as u8, 0, 0, 255]);
        ed.draw(Point::new(0, 0), c);
        ed.end_stroke();
    }
    assert_eq!(ed.history().undo_count(), 100);
}

#[test]
fn fill_changes_only_enclosed_region() {
    let mut ed = bordered_5x5();
    let before = ed.buffer().clone();
    assert!(ed.flood_fill(Point::new(2, 2), RED));

    let changed: Vec<Point> = Rect::of_grid(GridSize::new(5, 5))
        .cells()
        .filter(|p| ed.get_color(p.x, p.y) != before.get_color(p.x, p.y))
        .collect();
    assert_eq!(changed.len(), 9);
    assert!(changed.iter().all(|p| (1..=3).contains(&p.x) && (1..=3).contains(&p.y)));
    assert_inverse(&mut ed, &before);
}

#[test]
fn fill_with_target_colour_is_noop() {
    let mut ed = bordered_5x5();
    let before = ed.buffer().clone();
    assert!(!ed.flood_fill(Point::new(2, 2), WHITE));
    assert_eq!(ed.buffer(), &before);
    assert_eq!(ed.history().undo_count(), 0);
}

#[test]
fn selection_resize_clamps_to_one_cell() {
    let mut ed = editor(10, 10);
    ed.set_tool(Tool::Select);
    ed.set_selection_mode(SelectionMode::Rectangular);
    ed.pointer_down(Point::new(2, 2), PointerButton::Primary);
    ed.pointer_move(Point::new(4, 4));
    ed.pointer_up();

    // South-east handle dragged far up-left, past the north-west corner.
    ed.pointer_down(Point::new(5, 5), PointerButton::Primary);
    ed.pointer_move(Point::new(-20, -20));
    ed.pointer_up();
    let r = ed.selection().effective_rect().unwrap();
    assert_eq!((r.x, r.y, r.width, r.height), (2, 2, 1, 1));
}

#[test]
fn resample_round_trip_has_original_length() {
    for &(w, h, w2, h2) in &[(7u32, 5u32, 3u32, 11u32), (1, 1, 9, 2), (16, 16, 5, 5)] {
        let src: Vec<u32> = (0..w * h).collect();
        let mid = resample_nearest(&src, w, h, w2, h2);
        assert_eq!(mid.len(), (w2 * h2) as usize);
        let back = resample_nearest(&mid, w2, h2, w, h);
        assert_eq!(back.len(), (w * h) as usize);
        assert!(back.iter().all(|v| mid.contains(v)));
    }
}

#[test]
fn import_with_wrong_type_leaves_state_untouched() {
    let mut ed = editor(4, 4);
    ed.draw(Point::new(1, 1), RED);
    ed.end_stroke();
    let before = ed.buffer().clone();

    let pixels = vec!["0"; 64].join(",");
    let json = format!(r#"{{"version":"1.0","width":"4","height":4,"pixels":[{}]}}"#, pixels);
    assert!(ed.import_pxsm(&json).is_err());
    assert_eq!(ed.buffer(), &before);
    assert_eq!(ed.grid_size(), GridSize::new(4, 4));
    assert_eq!(ed.history().undo_count(), 1);
}

#[test]
fn project_export_import_round_trip() {
    let mut ed = editor(3, 2);
    ed.draw(Point::new(2, 1), BLUE);
    ed.end_stroke();
    let json = ed.export_pxsm().unwrap();

    let mut other = editor(8, 8);
    let before = other.buffer().clone();
    other.import_pxsm(&json).unwrap();
    assert_eq!(other.buffer(), ed.buffer());
    assert_inverse(&mut other, &before);
}

#[test]
fn every_action_kind_inverts() {
    let mut ed = editor(6, 6);
    ed.set_brush_size(2);

    // draw
    let before = ed.buffer().clone();
    ed.draw(Point::new(1, 1), RED);
    ed.draw(Point::new(4, 1), RED);
    ed.end_stroke();
    assert_inverse(&mut ed, &before);

    // bucket
    let before = ed.buffer().clone();
    ed.flood_fill(Point::new(5, 5), BLUE);
    assert_inverse(&mut ed, &before);

    // transform (move + resize)
    ed.set_tool(Tool::Select);
    ed.pointer_down(Point::new(0, 0), PointerButton::Primary);
    ed.pointer_move(Point::new(2, 2));
    ed.pointer_up();
    ed.pointer_down(Point::new(1, 1), PointerButton::Primary);
    ed.pointer_move(Point::new(2, 3));
    ed.pointer_up();
    // South-east handle of the moved (1,2,3,3) rect sits at (4,5).
    ed.pointer_down(Point::new(4, 5), PointerButton::Primary);
    ed.pointer_move(Point::new(5, 6));
    ed.pointer_up();
    assert_eq!(ed.selection().effective_rect(), Some(Rect::new(1, 2, 4, 4)));
    let before = ed.buffer().clone();
    assert!(ed.apply_selection_action());
    assert!(matches!(ed.history().undo_actions().next(), Some(Action::Transform { .. })));
    assert_inverse(&mut ed, &before);

    // delete
    ed.pointer_down(Point::new(0, 0), PointerButton::Primary);
    ed.pointer_move(Point::new(3, 3));
    ed.pointer_up();
    let before = ed.buffer().clone();
    assert!(ed.delete_selection());
    assert_inverse(&mut ed, &before);

    // paste
    ed.pointer_down(Point::new(0, 0), PointerButton::Primary);
    ed.pointer_move(Point::new(1, 1));
    ed.pointer_up();
    assert!(ed.copy());
    ed.set_pointer(Point::new(4, 4));
    assert!(ed.paste());
    let before = ed.buffer().clone();
    assert!(ed.apply_selection_action());
    assert!(matches!(ed.history().undo_actions().next(), Some(Action::Paste { .. })));
    assert_inverse(&mut ed, &before);

    // move (whole canvas)
    ed.set_tool(Tool::Move);
    let before = ed.buffer().clone();
    ed.pointer_down(Point::new(0, 0), PointerButton::Primary);
    ed.pointer_move(Point::new(-1, 2));
    ed.pointer_up();
    assert_inverse(&mut ed, &before);

    // new (resize)
    let before = ed.buffer().clone();
    assert!(ed.resize_canvas(GridSize::new(9, 3), (2, 1)));
    assert_inverse(&mut ed, &before);

    // clear
    let before = ed.buffer().clone();
    assert!(ed.clear_canvas());
    assert_inverse(&mut ed, &before);
}

#[test]
fn wand_selection_moves_only_matching_cells() {
    let mut ed = editor(4, 4);
    ed.draw(Point::new(0, 0), RED);
    ed.draw(Point::new(1, 0), RED);
    ed.end_stroke();
    ed.set_tool(Tool::Select);
    ed.set_selection_mode(SelectionMode::Wand);
    ed.pointer_down(Point::new(0, 0), PointerButton::Primary);
    ed.pointer_up();
    assert_eq!(ed.selection().selected_area, Some(Rect::new(0, 0, 2, 1)));

    ed.pointer_down(Point::new(0, 0), PointerButton::Primary);
    ed.pointer_move(Point::new(0, 3));
    ed.pointer_up();
    assert!(ed.apply_selection_action());
    assert_eq!(ed.get_color(0, 3), RED);
    assert_eq!(ed.get_color(1, 3), RED);
    assert_eq!(ed.get_color(0, 0), TRANSPARENT);
}

#[test]
fn palette_lists_most_used_first() {
    let mut ed = editor(3, 1);
    ed.draw(Point::new(0, 0), BLUE);
    ed.draw(Point::new(1, 0), RED);
    ed.draw(Point::new(2, 0), RED);
    ed.end_stroke();
    assert_eq!(ed.palette(256), vec![RED, BLUE]);
}

#[test]
fn png_export_respects_scale() {
    let mut ed = editor(4, 2);
    ed.draw(Point::new(0, 0), RED);
    ed.end_stroke();
    let img = ed.export_image(2.5).unwrap();
    assert_eq!(img.dimensions(), (10, 5));
    let bytes = ed.export_png(1.0).unwrap();
    let mut other = editor(1, 1);
    other.import_image(&bytes).unwrap();
    assert_eq!(other.buffer(), ed.buffer());
}

#[test]
fn open_stroke_lands_in_history_before_the_next_edit() {
    let mut ed = editor(3, 1);
    let before = ed.buffer().clone();
    ed.draw(Point::new(0, 0), RED);
    ed.set_tool(Tool::Bucket);
    ed.set_primary_color(BLUE);
    ed.pointer_down(Point::new(2, 0), PointerButton::Primary);
    ed.pointer_up();
    assert_eq!(ed.get_color(1, 0), BLUE);
    assert_eq!(ed.history().undo_count(), 2);

    ed.undo();
    assert_eq!(ed.get_color(0, 0), RED);
    assert_eq!(ed.get_color(2, 0), TRANSPARENT);
    ed.undo();
    assert_eq!(ed.buffer(), &before);
}

#[test]
fn masked_resize_clipped_by_grid_edge_inverts() {
    // Red L at (0,0), (0,1), (1,1) on a blue field.
    let mut buf = PixelBuffer::new(GridSize::new(4, 4));
    buf.fill(BLUE);
    for (x, y) in [(0, 0), (0, 1), (1, 1)] {
        buf.set_color(x, y, RED);
    }
    let mut ed = EditorState::from_buffer(buf);
    ed.set_tool(Tool::Select);
    ed.set_selection_mode(SelectionMode::Wand);
    ed.pointer_down(Point::new(0, 0), PointerButton::Primary);
    ed.pointer_up();
    assert_eq!(ed.selection().selected_area, Some(Rect::new(0, 0, 2, 2)));

    ed.pointer_down(Point::new(0, 0), PointerButton::Primary);
    ed.pointer_move(Point::new(2, 2));
    ed.pointer_up();
    // South-east handle of (2,2,2,2) sits off the grid at (4,4).
    ed.pointer_down(Point::new(4, 4), PointerButton::Primary);
    ed.pointer_move(Point::new(6, 6));
    ed.pointer_up();
    assert_eq!(ed.selection().effective_rect(), Some(Rect::new(2, 2, 4, 4)));

    let before = ed.buffer().clone();
    assert!(ed.apply_selection_action());

    let mut expected = PixelBuffer::new(GridSize::new(4, 4));
    expected.fill(BLUE);
    for (x, y) in [(0, 0), (0, 1), (1, 1)] {
        expected.set_color(x, y, TRANSPARENT);
    }
    for (x, y) in [(2, 2), (3, 2), (2, 3), (3, 3)] {
        expected.set_color(x, y, RED);
    }
    assert_eq!(ed.buffer(), &expected);
    assert_inverse(&mut ed, &before);
}
