//! Server-rendered HTML pages.
//!
//! Every page goes through [`layout`], which renders the navigation and the
//! pending flash message. All user-supplied text passes through [`escape`].

use bookings_core::dates::{format_date, DateRange};
use bookings_core::forms::{FormErrors, ReservationForm};
use bookings_core::types::DbId;
use bookings_core::workflow::ReservationDraft;
use bookings_db::models::room::Room;

use crate::session::Flash;

/// Static description of a room detail page.
pub struct RoomPage {
    pub id: DbId,
    pub name: &'static str,
    pub path: &'static str,
    pub blurb: &'static str,
}

pub const GENERALS_QUARTERS: RoomPage = RoomPage {
    id: 1,
    name: "General's Quarters",
    path: "/generals-quarters",
    blurb: "A spacious room with a view of the parade ground, fit for a general.",
};

pub const MAJORS_SUITE: RoomPage = RoomPage {
    id: 2,
    name: "Major's Suite",
    path: "/majors-suite",
    blurb: "A comfortable suite with a private sitting room and garden access.",
};

/// Escape text for use in HTML content and double-quoted attributes.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

pub fn layout(title: &str, flash: Option<&Flash>, body: &str) -> String {
    let flash = flash
        .map(|f| {
            format!(
                r#"<div class="alert alert-{}" role="alert">{}</div>"#,
                f.kind.as_str(),
                escape(&f.message)
            )
        })
        .unwrap_or_default();

    format!(
        r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title} | Fort Smythe Bed &amp; Breakfast</title>
</head>
<body>
<nav>
<a href="/">Home</a>
<a href="/about">About</a>
<a href="/generals-quarters">General's Quarters</a>
<a href="/majors-suite">Major's Suite</a>
<a href="/search-availability">Book Now</a>
<a href="/contact">Contact</a>
</nav>
{flash}
<main>
{body}
</main>
</body>
</html>
"#,
        title = escape(title),
    )
}

pub fn home(flash: Option<&Flash>) -> String {
    layout(
        "Home",
        flash,
        r#"<h1>Welcome to Fort Smythe Bed and Breakfast</h1>
<p>Your home away from home, set on the majestic waters of the Atlantic Ocean.</p>
<p><a href="/search-availability">Make a reservation now</a></p>"#,
    )
}

pub fn about(flash: Option<&Flash>) -> String {
    layout(
        "About",
        flash,
        r#"<h1>About</h1>
<p>Fort Smythe is a restored officers' residence offering two rooms to guests.</p>"#,
    )
}

pub fn contact(flash: Option<&Flash>) -> String {
    layout(
        "Contact",
        flash,
        r#"<h1>Contact</h1>
<p>Fort Smythe Bed and Breakfast, 100 Rocky Road, Northbrook.</p>"#,
    )
}

/// A room detail page with a form that books the room for chosen dates.
pub fn room(page: &RoomPage, flash: Option<&Flash>) -> String {
    let body = format!(
        r#"<h1>{name}</h1>
<p>{blurb}</p>
<form action="/book-room" method="get">
<input type="hidden" name="id" value="{id}">
<label for="s">Arrival</label> <input type="date" id="s" name="s" required>
<label for="e">Departure</label> <input type="date" id="e" name="e" required>
<button type="submit">Check availability and book</button>
</form>"#,
        name = escape(page.name),
        blurb = escape(page.blurb),
        id = page.id,
    );
    layout(page.name, flash, &body)
}

pub fn search_availability(flash: Option<&Flash>) -> String {
    layout(
        "Search for Availability",
        flash,
        r#"<h1>Search for Availability</h1>
<form action="/search-availability" method="post">
<label for="start">Starting date</label> <input type="date" id="start" name="start" required>
<label for="end">Ending date</label> <input type="date" id="end" name="end" required>
<button type="submit">Search Availability</button>
</form>"#,
    )
}

/// Search results: the free rooms for `dates`, each linking to its choice.
///
/// When the draft still holds a room that is free for these dates, a link to
/// continue with that room is shown first.
pub fn choose_room(
    rooms: &[Room],
    dates: DateRange,
    draft: &ReservationDraft,
    flash: Option<&Flash>,
) -> String {
    let continuing = match (draft.room_id, draft.room_name.as_deref()) {
        (Some(_), Some(name)) => format!(
            r#"<p><a href="/make-reservation">Continue booking {}</a></p>"#,
            escape(name)
        ),
        _ => String::new(),
    };

    let items: String = rooms
        .iter()
        .map(|room| {
            format!(
                r#"<li><a href="/choose-room/{}">{}</a></li>
"#,
                room.id,
                escape(&room.room_name)
            )
        })
        .collect();

    let body = format!(
        r#"<h1>Choose a Room</h1>
<p>Available from {start} to {end}:</p>
{continuing}<ul>
{items}</ul>"#,
        start = format_date(dates.start()),
        end = format_date(dates.end()),
    );
    layout("Choose a Room", flash, &body)
}

fn field(label: &str, name: &str, kind: &str, value: &str, errors: &FormErrors) -> String {
    let error = errors
        .get(name)
        .map(|msg| format!(r#" <span class="invalid">{}</span>"#, escape(msg)))
        .unwrap_or_default();
    format!(
        r#"<div>
<label for="{name}">{label}</label> <input type="{kind}" id="{name}" name="{name}" value="{value}">{error}
</div>
"#,
        value = escape(value),
    )
}

/// The contact form for a draft that has a room and dates.
///
/// `contact` holds the values to pre-fill; `errors` is empty on first view.
pub fn make_reservation(
    draft: &ReservationDraft,
    contact: &ReservationForm,
    errors: &FormErrors,
    flash: Option<&Flash>,
) -> String {
    let room = draft.room_name.as_deref().unwrap_or("your room");
    let stay = draft
        .dates
        .map(|d| {
            format!(
                "<p>Arrival: {}<br>Departure: {}</p>",
                format_date(d.start()),
                format_date(d.end())
            )
        })
        .unwrap_or_default();

    let body = format!(
        r#"<h1>Make Reservation</h1>
<p>Room: {room}</p>
{stay}
<form action="/make-reservation" method="post" novalidate>
{first}{last}{email}{phone}<button type="submit">Make Reservation</button>
</form>"#,
        room = escape(room),
        first = field("First name", "first_name", "text", &contact.first_name, errors),
        last = field("Last name", "last_name", "text", &contact.last_name, errors),
        email = field("Email", "email", "email", &contact.email, errors),
        phone = field("Phone", "phone", "text", &contact.phone, errors),
    );
    layout("Make Reservation", flash, &body)
}

pub fn reservation_summary(draft: &ReservationDraft, flash: Option<&Flash>) -> String {
    let (arrival, departure, nights) = draft
        .dates
        .map(|d| (format_date(d.start()), format_date(d.end()), d.nights()))
        .unwrap_or_default();

    let body = format!(
        r#"<h1>Reservation Summary</h1>
<table>
<tr><td>Name:</td><td>{first} {last}</td></tr>
<tr><td>Room:</td><td>{room}</td></tr>
<tr><td>Arrival:</td><td>{arrival}</td></tr>
<tr><td>Departure:</td><td>{departure}</td></tr>
<tr><td>Nights:</td><td>{nights}</td></tr>
<tr><td>Email:</td><td>{email}</td></tr>
<tr><td>Phone:</td><td>{phone}</td></tr>
</table>"#,
        first = escape(&draft.contact.first_name),
        last = escape(&draft.contact.last_name),
        room = escape(draft.room_name.as_deref().unwrap_or_default()),
        email = escape(&draft.contact.email),
        phone = escape(&draft.contact.phone),
    );
    layout("Reservation Summary", flash, &body)
}

pub fn not_found(message: &str) -> String {
    let body = format!(
        r#"<h1>Not Found</h1>
<p>{}</p>
<p><a href="/">Back to the home page</a></p>"#,
        escape(message)
    );
    layout("Not Found", None, &body)
}
