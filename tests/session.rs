//! End-to-end behaviour of sessions, windows and the deferred repaint

use tpanel::{
    AttrFlags, Colour, Config, Error, HeadlessBackend, Input, Key, Point, RawInput, Session,
    SessionState, Size,
};

fn open_session(rows: u16, cols: u16) -> Session<HeadlessBackend> {
    let mut session = Session::new(HeadlessBackend::new(rows, cols), Config::default()).unwrap();
    session.open().unwrap();
    session
}

#[test]
fn colour_pairs_are_stable_and_reversible() {
    let mut session = open_session(4, 8);
    // First colour use builds the table
    session
        .root_window()
        .unwrap()
        .colour(Colour::Black, Colour::Black)
        .unwrap();
    let registry = session.registry();
    assert!(registry.is_built());
    for fg in Colour::ALL {
        for bg in Colour::ALL {
            let pair = registry.colour_pair(fg, bg).unwrap();
            assert_eq!(registry.colour_pair(fg, bg).unwrap(), pair);
            assert_eq!(registry.decompose(pair).unwrap(), (fg, bg));
        }
    }
}

#[test]
fn content_cursor_maps_to_frame_origin_plus_offset() {
    let mut session = open_session(24, 80);
    let root = session.open().unwrap();
    let id = session
        .window(root)
        .unwrap()
        .create_bordered_child(Point::new(5, 10), Size::new(8, 40))
        .unwrap();

    let mut win = session.window(id).unwrap();
    win.addstr("some text").unwrap();
    win.move_to_cell(0, 0).unwrap();
    assert_eq!(win.cursor_position(), Point::new(0, 0));
    session.refresh().unwrap();

    let frame = session.stack().get(id).unwrap().frame();
    assert_eq!(frame.cursor().position(), Point::new(1, 1));
    assert_eq!(session.backend().cursor(), Some(Point::new(6, 11)));
}

#[test]
fn bordered_child_geometry() {
    let mut session = open_session(24, 80);
    let mut root = session.root_window().unwrap();
    let boxed = root
        .create_bordered_child(Point::new(0, 0), Size::new(8, 40))
        .unwrap();
    let tiny = root
        .create_bordered_child(Point::new(10, 10), Size::new(2, 2))
        .unwrap();

    let win = session.window(boxed).unwrap();
    assert!(win.has_content());
    assert_eq!(win.content_origin(), Point::new(1, 1));
    assert_eq!(win.content_size(), Size::new(6, 38));

    let mut win = session.window(tiny).unwrap();
    assert!(!win.has_content());
    assert_eq!(win.content_size(), Size::new(2, 2));
    // Paint falls through to the frame
    win.addstr("ab").unwrap();
    assert_eq!(win.line_text(0), "ab");
}

#[test]
fn destroy_uncovers_the_surface_below() {
    let mut session = open_session(6, 12);
    let root = session.open().unwrap();
    let lower = session
        .window(root)
        .unwrap()
        .create_child(Point::new(1, 1), Size::new(3, 10))
        .unwrap();
    session.window(lower).unwrap().addstr("lowerlower").unwrap();
    let upper = session
        .window(root)
        .unwrap()
        .create_child(Point::new(1, 1), Size::new(1, 5))
        .unwrap();
    session.window(upper).unwrap().addstr("UPPER").unwrap();
    session.refresh().unwrap();
    assert_eq!(session.backend().row_text(1), " UPPERlower ");

    session.destroy(upper).unwrap();
    assert!(!session.stack().z_order().contains(&upper));
    assert_eq!(session.backend().row_text(1), " lowerlower ");
    assert!(matches!(
        session.window(upper),
        Err(Error::UnknownSurface(id)) if id == upper
    ));
}

#[test]
fn refresh_writes_once_and_only_changes() {
    let mut session = open_session(4, 10);
    session.root_window().unwrap().addstr("hello").unwrap();
    session.refresh().unwrap();
    let draws = session.backend().draw_count();

    // Painting alone does not reach the terminal
    session.root_window().unwrap().addstr("!").unwrap();
    assert_eq!(session.backend().draw_count(), draws);

    assert_eq!(session.refresh().unwrap(), 1);
    assert_eq!(session.backend().draw_count(), draws + 1);
    assert_eq!(session.backend().row_text(0), "hello!    ");

    assert_eq!(session.refresh().unwrap(), 0);
    assert_eq!(session.backend().draw_count(), draws + 1);
}

#[test]
fn attribute_round_trip_and_unknown_codes() {
    let mut session = open_session(2, 2);
    let mut root = session.root_window().unwrap();
    let before = root.attrs();
    root.attr_on("B").unwrap().attr_off("B").unwrap();
    assert_eq!(root.attrs(), before);

    root.attr_on("Z").unwrap();
    assert_eq!(root.attrs(), before);

    root.attr_set("UR", None).unwrap();
    assert_eq!(root.attrs(), AttrFlags::UNDERLINE | AttrFlags::REVERSE);
}

#[test]
fn open_and_close_are_idempotent() {
    let mut session = Session::new(HeadlessBackend::new(4, 4), Config::default()).unwrap();
    let first = session.open().unwrap();
    assert_eq!(session.open().unwrap(), first);
    assert_eq!(session.state(), SessionState::Open);

    assert!(session.close().unwrap());
    assert!(!session.close().unwrap());
    assert_eq!(session.state(), SessionState::Closed);
    assert!(matches!(session.getch(), Err(Error::NotOpen)));
}

#[test]
fn destroying_root_is_rejected() {
    let mut session = open_session(4, 4);
    let root = session.open().unwrap();
    assert!(matches!(
        session.destroy(root),
        Err(Error::InvariantViolation(_))
    ));
}

#[test]
fn keys_are_translated() {
    let mut session = open_session(4, 4);
    session.backend_mut().push_input(RawInput::Code(0o410 + 10));
    session.backend_mut().push_str("x");
    assert_eq!(session.getch().unwrap(), Some(Input::Key(Key::F(10))));
    assert_eq!(session.getch().unwrap(), Some(Input::Char('x')));
    assert_eq!(session.getch().unwrap(), None);
    assert!(session.is_supported(Key::Left));
    assert!(!session.is_supported(Key::Undo));
}

#[test]
fn overlapping_windows_follow_z_order() {
    let mut session = open_session(3, 6);
    let root = session.open().unwrap();
    let a = session
        .window(root)
        .unwrap()
        .create_child(Point::new(0, 0), Size::new(1, 4))
        .unwrap();
    let b = session
        .window(root)
        .unwrap()
        .create_child(Point::new(0, 2), Size::new(1, 4))
        .unwrap();
    session.window(a).unwrap().addstr("aaaa").unwrap();
    session.window(b).unwrap().addstr("bbbb").unwrap();
    session.refresh().unwrap();
    assert_eq!(session.backend().row_text(0), "aabbbb");

    session.window(a).unwrap().send_to_front().unwrap();
    session.refresh().unwrap();
    assert_eq!(session.backend().row_text(0), "aaaabb");
    assert_eq!(session.stack().surface_at(Point::new(0, 3)), Some(a));

    session.window(a).unwrap().hide().unwrap();
    session.refresh().unwrap();
    assert_eq!(session.backend().row_text(0), "aabbbb");
}

#[test]
fn colour_reaches_the_terminal() {
    let mut session = open_session(1, 4);
    session
        .root_window()
        .unwrap()
        .colour(Colour::Green, Colour::Black)
        .unwrap()
        .addstr("ok")
        .unwrap();
    session.refresh().unwrap();
    let cell = session.backend().cell(Point::new(0, 0)).unwrap();
    assert_eq!(cell.fg, Some(Colour::Green.ansi()));
    assert_eq!(cell.bg, Some(Colour::Black.ansi()));
}

#[test]
fn clear_forces_full_repaint() {
    let mut session = open_session(2, 3);
    session.root_window().unwrap().addstr("abc").unwrap();
    session.refresh().unwrap();
    session.root_window().unwrap().clear().unwrap();
    // Every cell goes out again, not just the three that changed
    assert_eq!(session.refresh().unwrap(), 6);
}
