use core::fmt::Write;

use embedded_graphics::{
    mono_font::{
        MonoFont, MonoTextStyle,
        ascii::{FONT_6X10, FONT_9X15, FONT_10X20},
    },
    pixelcolor::Rgb565,
    prelude::*,
    primitives::{PrimitiveStyle, Rectangle},
    text::{Alignment, Baseline, Text, TextStyle, TextStyleBuilder},
};
use heapless::String;
use lifeline_core::{
    catalog::{AlertDescriptor, Priority},
    network::LinkStatus,
    radio::{Bandwidth, CodingRate, RadioProfile, SpreadingFactor},
    render::{AlertRowView, AnimationFrame, AnimationKind, MenuItemView, Screen, TransmitterStats},
    text_policy::{age_label, device_label, rssi_label},
};

use super::FrameRenderer;

const HEADER_H: i32 = 36;
const FOOTER_H: i32 = 28;
const MARGIN_X: i32 = 12;
const MENU_LIST_TOP: i32 = 52;
const MENU_ROW_H: i32 = 44;
const HISTORY_ROW_H: i32 = 34;
const HOLD_BAR_H: u32 = 10;

const BACKGROUND: Rgb565 = Rgb565::BLACK;
const FOREGROUND: Rgb565 = Rgb565::WHITE;
const MUTED: Rgb565 = Rgb565::new(14, 28, 14);
const HEADER_BG: Rgb565 = Rgb565::new(3, 6, 8);
const ORANGE: Rgb565 = Rgb565::new(31, 40, 0);

/// Colour-coded renderer for the 320x480 portrait panel.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScreenRenderer;

impl ScreenRenderer {
    pub const fn new() -> Self {
        Self
    }
}

impl FrameRenderer for ScreenRenderer {
    fn render<D>(&mut self, screen: Screen<'_>, target: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        match screen {
            Screen::Boot {
                title,
                subtitle,
                status,
            } => {
                target.clear(BACKGROUND)?;
                let (_, height) = panel_size(target);
                centered(target, title, height / 2 - 60, font(&FONT_10X20, FOREGROUND))?;
                centered(target, subtitle, height / 2 - 20, font(&FONT_9X15, MUTED))?;
                let status_color = if status.contains("UNAVAILABLE") {
                    Rgb565::RED
                } else {
                    Rgb565::GREEN
                };
                centered(target, status, height / 2 + 30, font(&FONT_9X15, status_color))
            }
            Screen::Menu {
                title,
                items,
                cursor,
                position,
                radio_ok,
                animation,
            } => {
                target.clear(BACKGROUND)?;
                draw_header(target, title, radio_badge(radio_ok))?;
                let dx = slide_offset(animation, target);
                draw_menu_rows(target, items, cursor, dx)?;
                draw_footer(target, "A/B move  # select  C info  D help", Some(position))
            }
            Screen::Confirm {
                alert,
                device,
                radio_ok,
                animation,
            } => {
                target.clear(BACKGROUND)?;
                draw_header(target, "CONFIRM ALERT", radio_badge(radio_ok))?;
                let dx = slide_offset(animation, target);
                draw_alert_card(target, alert, MENU_LIST_TOP + 40, dx, body_color(animation))?;
                centered(target, device, MENU_LIST_TOP + 200, font(&FONT_9X15, MUTED))?;
                draw_footer(target, "# send   * cancel", None)
            }
            Screen::Sending {
                alert,
                attempt,
                max_attempts,
            } => {
                target.clear(BACKGROUND)?;
                draw_header(target, "SENDING", None)?;
                draw_alert_card(target, alert, MENU_LIST_TOP + 40, 0, FOREGROUND)?;

                let mut line: String<24> = String::new();
                let _ = write!(line, "Attempt {}/{}", attempt, max_attempts);
                let (_, height) = panel_size(target);
                centered(target, &line, height / 2 + 40, font(&FONT_10X20, Rgb565::YELLOW))
            }
            Screen::TransmitResult {
                alert,
                success,
                attempt,
                max_attempts,
                can_retry,
                animation,
            } => {
                target.clear(BACKGROUND)?;
                let (badge, color) = if success {
                    ("SENT", Rgb565::GREEN)
                } else {
                    ("FAILED", Rgb565::RED)
                };
                draw_header(target, "RESULT", Some((badge, color)))?;
                let dx = slide_offset(animation, target);
                draw_alert_card(target, alert, MENU_LIST_TOP + 40, dx, FOREGROUND)?;

                let (_, height) = panel_size(target);
                centered(target, badge, height / 2 + 20, font(&FONT_10X20, color))?;
                let mut line: String<24> = String::new();
                let _ = write!(line, "Attempts {}/{}", attempt, max_attempts);
                centered(target, &line, height / 2 + 50, font(&FONT_9X15, MUTED))?;

                let hint = if success {
                    "Returning to menu"
                } else if can_retry {
                    "# retry   * menu"
                } else {
                    "Out of retries   * menu"
                };
                draw_footer(target, hint, None)
            }
            Screen::SystemInfo { stats } => {
                target.clear(BACKGROUND)?;
                draw_header(target, "SYSTEM INFO", radio_badge(stats.radio_ok))?;
                draw_system_info(target, &stats)?;
                draw_footer(target, "Any key to return", None)
            }
            Screen::Manual {
                title,
                lines,
                position,
            } => {
                target.clear(BACKGROUND)?;
                draw_header(target, title, None)?;
                let style = font(&FONT_9X15, FOREGROUND);
                let mut y = MENU_LIST_TOP;
                for line in lines {
                    text(target, line, Point::new(MARGIN_X, y), style)?;
                    y += 22;
                }
                draw_footer(target, "A/B page   # or * back", Some(position))
            }
            Screen::Idle {
                title,
                recent,
                total_received,
                link,
                radio_ok,
                hold_pct,
            } => {
                target.clear(BACKGROUND)?;
                draw_header(target, title, Some(link_badge(link)))?;

                let mut line: String<32> = String::new();
                let _ = write!(line, "Received: {}", total_received);
                text(
                    target,
                    &line,
                    Point::new(MARGIN_X, HEADER_H + 8),
                    font(&FONT_9X15, FOREGROUND),
                )?;
                if !radio_ok {
                    right_aligned(
                        target,
                        "NO RADIO",
                        HEADER_H + 8,
                        font(&FONT_9X15, Rgb565::RED),
                    )?;
                }

                if recent.is_empty() {
                    let (_, height) = panel_size(target);
                    centered(target, "Listening...", height / 2, font(&FONT_10X20, MUTED))?;
                } else {
                    draw_history_rows(target, recent, HEADER_H + 36)?;
                }

                draw_hold_or_footer(target, hold_pct, "D rejoin WiFi   hold button: setup")
            }
            Screen::Alert {
                alert,
                device,
                rssi,
                link,
                hold_pct,
                animation,
            } => {
                let accent = priority_color(alert.priority);
                let (background, foreground) = if flash_on(animation) {
                    (accent, BACKGROUND)
                } else {
                    (BACKGROUND, accent)
                };
                target.clear(background)?;
                draw_header(target, "INCOMING ALERT", Some(link_badge(link)))?;

                let (_, height) = panel_size(target);
                centered(
                    target,
                    alert.priority.label(),
                    height / 2 - 90,
                    font(&FONT_10X20, foreground),
                )?;
                centered(
                    target,
                    alert.long_name,
                    height / 2 - 40,
                    font(&FONT_10X20, foreground),
                )?;
                let detail = if background == BACKGROUND {
                    FOREGROUND
                } else {
                    BACKGROUND
                };
                centered(target, device, height / 2 + 10, font(&FONT_10X20, detail))?;
                centered(target, rssi, height / 2 + 40, font(&FONT_9X15, detail))?;

                draw_hold_or_footer(target, hold_pct, "# dismiss")
            }
            Screen::Portal {
                ap_ssid,
                address,
                remaining_s,
                saved,
                hold_pct,
            } => {
                target.clear(BACKGROUND)?;
                draw_header(target, "WIFI SETUP", Some(link_badge(LinkStatus::Portal)))?;

                let label = font(&FONT_9X15, MUTED);
                let value = font(&FONT_10X20, FOREGROUND);
                let mut y = MENU_LIST_TOP;
                text(target, "1. Join network", Point::new(MARGIN_X, y), label)?;
                text(target, ap_ssid, Point::new(MARGIN_X + 16, y + 20), value)?;
                y += 64;
                text(target, "2. Open in a browser", Point::new(MARGIN_X, y), label)?;
                let mut url: String<48> = String::new();
                let _ = write!(url, "http://{}", address);
                text(target, &url, Point::new(MARGIN_X + 16, y + 20), value)?;
                y += 64;

                if saved {
                    text(
                        target,
                        "Saved. Restarting...",
                        Point::new(MARGIN_X, y),
                        font(&FONT_10X20, Rgb565::GREEN),
                    )?;
                } else {
                    let mut line: String<32> = String::new();
                    let _ = write!(line, "Closes in {}:{:02}", remaining_s / 60, remaining_s % 60);
                    text(target, &line, Point::new(MARGIN_X, y), font(&FONT_9X15, Rgb565::YELLOW))?;
                }

                draw_hold_or_footer(target, hold_pct, "Hold button to close")
            }
        }
    }
}

fn draw_menu_rows<D>(
    target: &mut D,
    items: &[MenuItemView],
    cursor: usize,
    dx: i32,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    let (width, _) = panel_size(target);

    for (idx, item) in items.iter().enumerate() {
        let top = MENU_LIST_TOP + idx as i32 * MENU_ROW_H;
        let accent = priority_color(item.descriptor.priority);
        let selected = idx == cursor;

        let row = Rectangle::new(
            Point::new(MARGIN_X / 2 + dx, top),
            Size::new((width - MARGIN_X) as u32, (MENU_ROW_H - 6) as u32),
        );
        if selected {
            row.into_styled(PrimitiveStyle::with_fill(accent)).draw(target)?;
        } else {
            row.into_styled(PrimitiveStyle::with_stroke(MUTED, 1)).draw(target)?;
            Rectangle::new(row.top_left, Size::new(6, row.size.height))
                .into_styled(PrimitiveStyle::with_fill(accent))
                .draw(target)?;
        }

        let fg = if selected { BACKGROUND } else { FOREGROUND };
        let mut letter = [0u8; 4];
        text(
            target,
            item.code.letter().encode_utf8(&mut letter),
            Point::new(MARGIN_X + 6 + dx, top + 9),
            font(&FONT_10X20, fg),
        )?;
        text(
            target,
            item.descriptor.long_name,
            Point::new(MARGIN_X + 30 + dx, top + 9),
            font(&FONT_10X20, fg),
        )?;
        Text::with_text_style(
            item.descriptor.priority.label(),
            Point::new(width - MARGIN_X + dx, top + 2),
            font(&FONT_6X10, if selected { BACKGROUND } else { accent }),
            aligned(Alignment::Right),
        )
        .draw(target)?;
    }

    Ok(())
}

fn draw_alert_card<D>(
    target: &mut D,
    alert: &AlertDescriptor,
    top: i32,
    dx: i32,
    color: Rgb565,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    let (width, _) = panel_size(target);
    let accent = priority_color(alert.priority);

    Rectangle::new(
        Point::new(MARGIN_X + dx, top),
        Size::new((width - 2 * MARGIN_X) as u32, 120),
    )
    .into_styled(PrimitiveStyle::with_stroke(accent, 3))
    .draw(target)?;

    let center = width / 2 + dx;
    Text::with_text_style(
        alert.priority.label(),
        Point::new(center, top + 16),
        font(&FONT_9X15, accent),
        aligned(Alignment::Center),
    )
    .draw(target)?;
    Text::with_text_style(
        alert.long_name,
        Point::new(center, top + 50),
        font(&FONT_10X20, color),
        aligned(Alignment::Center),
    )
    .draw(target)?;

    let mut code: String<16> = String::new();
    let _ = write!(code, "Code {} ({})", alert.code.index(), alert.code.letter());
    Text::with_text_style(
        &code,
        Point::new(center, top + 86),
        font(&FONT_6X10, MUTED),
        aligned(Alignment::Center),
    )
    .draw(target)?;
    Ok(())
}

fn draw_history_rows<D>(target: &mut D, rows: &[AlertRowView], top: i32) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    let (width, height) = panel_size(target);
    let bottom = height - FOOTER_H;

    for (idx, row) in rows.iter().enumerate() {
        let y = top + idx as i32 * HISTORY_ROW_H;
        if y + HISTORY_ROW_H > bottom {
            break;
        }

        let accent = priority_color(row.descriptor.priority);
        Rectangle::new(Point::new(MARGIN_X, y), Size::new(6, (HISTORY_ROW_H - 8) as u32))
            .into_styled(PrimitiveStyle::with_fill(accent))
            .draw(target)?;

        text(
            target,
            row.descriptor.short_name,
            Point::new(MARGIN_X + 14, y + 2),
            font(&FONT_9X15, accent),
        )?;

        let mut id_buf = [0u8; 8];
        let mut rssi_buf = [0u8; 12];
        let mut age_buf = [0u8; 8];
        let mut detail: String<40> = String::new();
        let _ = write!(
            detail,
            "{}  {}",
            device_label(row.device_id, &mut id_buf),
            rssi_label(row.rssi, &mut rssi_buf)
        );
        text(
            target,
            &detail,
            Point::new(MARGIN_X + 14, y + 18),
            font(&FONT_6X10, MUTED),
        )?;
        Text::with_text_style(
            age_label(row.age_ms, &mut age_buf),
            Point::new(width - MARGIN_X, y + 2),
            font(&FONT_9X15, FOREGROUND),
            aligned(Alignment::Right),
        )
        .draw(target)?;
    }

    Ok(())
}

fn draw_system_info<D>(target: &mut D, stats: &TransmitterStats) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    let label = font(&FONT_9X15, MUTED);
    let value = font(&FONT_9X15, FOREGROUND);
    let (width, _) = panel_size(target);
    let mut y = MENU_LIST_TOP;

    let mut row = |target: &mut D, name: &str, shown: &str| -> Result<(), D::Error> {
        text(target, name, Point::new(MARGIN_X, y), label)?;
        Text::with_text_style(
            shown,
            Point::new(width - MARGIN_X, y),
            value,
            aligned(Alignment::Right),
        )
        .draw(target)?;
        y += 26;
        Ok(())
    };

    let mut id_buf = [0u8; 8];
    row(target, "Device", device_label(stats.device_id, &mut id_buf))?;
    row(
        target,
        "Radio",
        if stats.radio_ok { "ready" } else { "unavailable" },
    )?;

    let mut buf: String<24> = String::new();
    let _ = write!(buf, "{}", stats.total_transmissions);
    row(target, "Sent", &buf)?;

    buf.clear();
    let _ = write!(buf, "{}", stats.successful_transmissions);
    row(target, "Delivered", &buf)?;

    buf.clear();
    let secs = stats.uptime_ms / 1_000;
    let _ = write!(buf, "{}:{:02}:{:02}", secs / 3_600, (secs / 60) % 60, secs % 60);
    row(target, "Uptime", &buf)?;

    write_profile_rows(target, &stats.profile, &mut row)
}

fn write_profile_rows<D, F>(target: &mut D, profile: &RadioProfile, row: &mut F) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
    F: FnMut(&mut D, &str, &str) -> Result<(), D::Error>,
{
    let mut buf: String<24> = String::new();
    let _ = write!(
        buf,
        "{}.{:03} MHz",
        profile.frequency_hz / 1_000_000,
        (profile.frequency_hz / 1_000) % 1_000
    );
    row(target, "Frequency", &buf)?;

    buf.clear();
    let _ = write!(
        buf,
        "SF{} {} CR{}",
        spreading_factor_value(profile.spreading_factor),
        bandwidth_label(profile.bandwidth),
        coding_rate_label(profile.coding_rate)
    );
    row(target, "Modulation", &buf)?;

    buf.clear();
    let _ = write!(buf, "{} dBm", profile.tx_power_dbm);
    row(target, "Power", &buf)
}

fn draw_header<D>(
    target: &mut D,
    title: &str,
    badge: Option<(&str, Rgb565)>,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    let (width, _) = panel_size(target);
    Rectangle::new(Point::zero(), Size::new(width as u32, HEADER_H as u32))
        .into_styled(PrimitiveStyle::with_fill(HEADER_BG))
        .draw(target)?;
    text(target, title, Point::new(MARGIN_X, 8), font(&FONT_10X20, FOREGROUND))?;

    if let Some((label, color)) = badge {
        right_aligned(target, label, 12, font(&FONT_9X15, color))?;
    }
    Ok(())
}

fn draw_footer<D>(target: &mut D, hint: &str, position: Option<&str>) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    let (_, height) = panel_size(target);
    let y = height - FOOTER_H + 8;
    text(target, hint, Point::new(MARGIN_X, y), font(&FONT_6X10, MUTED))?;
    if let Some(position) = position {
        right_aligned(target, position, y, font(&FONT_6X10, FOREGROUND))?;
    }
    Ok(())
}

/// A running hold replaces the footer with a progress bar.
fn draw_hold_or_footer<D>(target: &mut D, hold_pct: Option<u8>, hint: &str) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    let Some(pct) = hold_pct else {
        return draw_footer(target, hint, None);
    };

    let (width, height) = panel_size(target);
    let track_w = (width - 2 * MARGIN_X) as u32;
    let top = height - FOOTER_H + 4;
    let track = Rectangle::new(Point::new(MARGIN_X, top), Size::new(track_w, HOLD_BAR_H));

    track
        .into_styled(PrimitiveStyle::with_fill(BACKGROUND))
        .draw(target)?;
    track
        .into_styled(PrimitiveStyle::with_stroke(FOREGROUND, 1))
        .draw(target)?;
    let filled = track_w * pct.min(100) as u32 / 100;
    if filled > 0 {
        Rectangle::new(track.top_left, Size::new(filled, HOLD_BAR_H))
            .into_styled(PrimitiveStyle::with_fill(Rgb565::CYAN))
            .draw(target)?;
    }
    Ok(())
}

fn text<D>(
    target: &mut D,
    s: &str,
    at: Point,
    style: MonoTextStyle<'_, Rgb565>,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    Text::with_baseline(s, at, style, Baseline::Top).draw(target)?;
    Ok(())
}

fn centered<D>(
    target: &mut D,
    s: &str,
    y: i32,
    style: MonoTextStyle<'_, Rgb565>,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    let (width, _) = panel_size(target);
    Text::with_text_style(s, Point::new(width / 2, y), style, aligned(Alignment::Center))
        .draw(target)?;
    Ok(())
}

fn right_aligned<D>(
    target: &mut D,
    s: &str,
    y: i32,
    style: MonoTextStyle<'_, Rgb565>,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    let (width, _) = panel_size(target);
    Text::with_text_style(
        s,
        Point::new(width - MARGIN_X, y),
        style,
        aligned(Alignment::Right),
    )
    .draw(target)?;
    Ok(())
}

fn font(font: &'static MonoFont<'static>, color: Rgb565) -> MonoTextStyle<'static, Rgb565> {
    MonoTextStyle::new(font, color)
}

fn aligned(alignment: Alignment) -> TextStyle {
    TextStyleBuilder::new()
        .alignment(alignment)
        .baseline(Baseline::Top)
        .build()
}

fn panel_size<D: Dimensions>(target: &D) -> (i32, i32) {
    let size = target.bounding_box().size;
    (size.width as i32, size.height as i32)
}

fn priority_color(priority: Priority) -> Rgb565 {
    match priority {
        Priority::Critical => Rgb565::RED,
        Priority::High => ORANGE,
        Priority::Medium => Rgb565::YELLOW,
        Priority::Ok => Rgb565::GREEN,
        Priority::Info => Rgb565::CYAN,
    }
}

fn link_badge(link: LinkStatus) -> (&'static str, Rgb565) {
    let color = match link {
        LinkStatus::Online => Rgb565::GREEN,
        LinkStatus::Connecting => Rgb565::YELLOW,
        LinkStatus::Portal => Rgb565::CYAN,
        LinkStatus::Offline => MUTED,
    };
    (link.label(), color)
}

fn radio_badge(radio_ok: bool) -> Option<(&'static str, Rgb565)> {
    if radio_ok {
        Some(("LoRa", Rgb565::GREEN))
    } else {
        Some(("NO RADIO", Rgb565::RED))
    }
}

/// Horizontal shift for slide transitions; content eases in from a quarter panel away.
fn slide_offset<D: Dimensions>(animation: Option<AnimationFrame>, target: &D) -> i32 {
    let (width, _) = panel_size(target);
    let Some(frame) = animation else {
        return 0;
    };
    let remaining = 100 - frame.progress_pct.min(100) as i32;
    match frame.kind {
        AnimationKind::SlideLeft => remaining * width / 400,
        AnimationKind::SlideRight => -(remaining * width / 400),
        AnimationKind::Fade | AnimationKind::Flash => 0,
    }
}

fn body_color(animation: Option<AnimationFrame>) -> Rgb565 {
    match animation {
        Some(AnimationFrame {
            kind: AnimationKind::Fade,
            progress_pct,
        }) if progress_pct < 50 => MUTED,
        _ => FOREGROUND,
    }
}

/// Flash alternates every tenth of the animation.
fn flash_on(animation: Option<AnimationFrame>) -> bool {
    matches!(
        animation,
        Some(AnimationFrame {
            kind: AnimationKind::Flash,
            progress_pct,
        }) if (progress_pct / 10) % 2 == 0
    )
}

fn spreading_factor_value(sf: SpreadingFactor) -> u8 {
    match sf {
        SpreadingFactor::Sf7 => 7,
        SpreadingFactor::Sf8 => 8,
        SpreadingFactor::Sf9 => 9,
        SpreadingFactor::Sf10 => 10,
        SpreadingFactor::Sf11 => 11,
        SpreadingFactor::Sf12 => 12,
    }
}

fn bandwidth_label(bw: Bandwidth) -> &'static str {
    match bw {
        Bandwidth::Khz125 => "125k",
        Bandwidth::Khz250 => "250k",
        Bandwidth::Khz500 => "500k",
    }
}

fn coding_rate_label(cr: CodingRate) -> &'static str {
    match cr {
        CodingRate::Cr4_5 => "4/5",
        CodingRate::Cr4_6 => "4/6",
        CodingRate::Cr4_7 => "4/7",
        CodingRate::Cr4_8 => "4/8",
    }
}
