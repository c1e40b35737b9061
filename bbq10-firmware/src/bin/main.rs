#![no_std]
#![no_main]
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those     holding buffers for the duration of a data transfer."
)]

use bbq10_firmware::{
    board::Board,
    slave::{self, REGISTERS},
};
use bbq10_i2c_slave_async::{responder::ResponderConfig, signal::ReadySignal};
use bbq10_keyboard_async::keyboard::{Keyboard, ScanConfig};
use bbq10_trackball_async::{
    accumulator::{Direction, TrackballAccumulator, TrackballConfig},
    led::{Color, TrackballLed},
};
use embassy_executor::Spawner;
use embassy_time::{Delay, Duration, Instant, Timer};
use esp_hal::{
    clock::CpuClock,
    gpio::{Input, Output},
    timer::systimer::SystemTimer,
};
use esp_println::println;
use log::{error, info, warn};

#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    println!("{}", info);
    loop {}
}

esp_bootloader_esp_idf::esp_app_desc!();

/// Pause between matrix scans. A scan itself takes one settle delay per
/// column.
const SCAN_PERIOD: Duration = Duration::from_millis(5);

/// How often accumulated trackball motion is published.
const REPORT_PERIOD: Duration = Duration::from_millis(10);

static TRACKBALL: TrackballAccumulator = TrackballAccumulator::new(TrackballConfig::DEFAULT);

type BridgeKeyboard = Keyboard<Input<'static>, Output<'static>, Delay>;
type ReadyLine = ReadySignal<Output<'static>, Delay>;

#[esp_hal_embassy::main]
async fn main(spawner: Spawner) {
    esp_println::logger::init_logger(log::LevelFilter::Info);
    info!("Logger initialized");

    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);
    info!("Peripherals initialized");

    let timer0 = SystemTimer::new(peripherals.SYSTIMER);
    esp_hal_embassy::init(timer0.alarm0);

    let Board {
        rows,
        cols,
        trackball,
        leds,
        keyboard_ready,
        trackball_ready,
        mut i2c,
    } = Board::new(peripherals).expect("Could not initialize I2C");

    let [blue, red, green, white] = leds;
    let mut led = TrackballLed::new(blue, red, green, white);
    if let Err(err) = led.set(Color::All) {
        warn!("Failed to light trackball: {err:?}");
    }

    let mut keyboard = Keyboard::new(rows, cols, Delay, ScanConfig::default());
    if let Err(err) = keyboard.init() {
        error!("Failed to initialize keyboard matrix: {err:?}");
    }

    let mut keyboard_ready = ReadySignal::new(keyboard_ready, Delay);
    let mut trackball_ready = ReadySignal::new(trackball_ready, Delay);
    if keyboard_ready.init().is_err() || trackball_ready.init().is_err() {
        warn!("Failed to idle ready lines");
    }

    slave::start(&mut i2c, ResponderConfig::default());

    spawner
        .spawn(keyboard_task(keyboard, keyboard_ready))
        .expect("Failed to spawn keyboard_task");
    spawner
        .spawn(trackball_report_task(trackball_ready))
        .expect("Failed to spawn trackball_report_task");
    spawner
        .spawn(trackball_button_task(trackball.button))
        .expect("Failed to spawn trackball_button_task");
    for (pin, direction) in [
        (trackball.up, Direction::Up),
        (trackball.down, Direction::Down),
        (trackball.left, Direction::Left),
        (trackball.right, Direction::Right),
    ] {
        spawner
            .spawn(trackball_motion_task(pin, direction))
            .expect("Failed to spawn trackball_motion_task");
    }

    info!("Bridge running. Entering idle loop.");
    // `i2c` owns the peripheral clock and pin routing, keep it alive.
    loop {
        Timer::after(Duration::from_secs(1)).await;
    }
}

/// Scans the matrix and publishes every key event.
#[embassy_executor::task]
async fn keyboard_task(mut keyboard: BridgeKeyboard, mut ready: ReadyLine) {
    loop {
        match keyboard.poll(Instant::now()).await {
            Ok(Some(event)) => {
                info!("Key {:?} repeat={}", event.key as char, event.repeat);
                REGISTERS.wait_idle().await;
                REGISTERS.set_keyboard(event.key);
                if let Err(err) = ready.pulse().await {
                    warn!("Failed to pulse keyboard ready: {err:?}");
                }
            }
            Ok(None) => {}
            Err(err) => warn!("Keyboard scan failed: {err:?}"),
        }
        Timer::after(SCAN_PERIOD).await;
    }
}

/// Publishes accumulated trackball motion and clicks.
#[embassy_executor::task]
async fn trackball_report_task(mut ready: ReadyLine) {
    loop {
        Timer::after(REPORT_PERIOD).await;
        let Some(payload) = TRACKBALL.get_deltas().to_payload() else {
            continue;
        };

        REGISTERS.wait_idle().await;
        REGISTERS.set_trackball(payload);
        if let Err(err) = ready.pulse().await {
            warn!("Failed to pulse trackball ready: {err:?}");
        }
    }
}

/// Feeds one direction sensor into the accumulator.
#[embassy_executor::task(pool_size = 4)]
async fn trackball_motion_task(mut pin: Input<'static>, direction: Direction) {
    loop {
        pin.wait_for_falling_edge().await;
        TRACKBALL.on_motion(direction);
    }
}

/// Feeds the trackball button into the accumulator. The level is sampled
/// once the debounce window of an accepted edge has passed.
#[embassy_executor::task]
async fn trackball_button_task(mut pin: Input<'static>) {
    let debounce = TRACKBALL.config().button_debounce;
    loop {
        pin.wait_for_falling_edge().await;
        if TRACKBALL.on_button_edge(Instant::now()) {
            Timer::after(debounce).await;
            TRACKBALL.on_button_settled(pin.is_low());
        }
    }
}
