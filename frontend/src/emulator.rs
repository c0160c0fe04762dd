use neogeo_core::core::machine::Machine;
use neogeo_machines::NeoGeoSystem;
use sdl2::event::Event;
use sdl2::keyboard::Scancode;
use std::sync::atomic::Ordering;

use crate::audio;
use crate::input::KeyMap;
use crate::video::Video;

/// YM2610 stereo sample rate: master clock / DIV_YM2610, matching
/// `neogeo_core::system`'s scheduler apportionment.
const SAMPLE_RATE: u32 = 55_555;

pub fn run(machine: &mut NeoGeoSystem, key_map: &KeyMap, scale: u32) {
    let sdl_context = sdl2::init().expect("Failed to initialize SDL2");
    let sdl_video = sdl_context.video().expect("Failed to init SDL video");
    let sdl_audio = sdl_context.audio().expect("Failed to init SDL audio");

    let (width, height) = machine.display_size();
    let mut video = Video::new(&sdl_video, "Neo Geo", width, height, scale);
    let mut event_pump = sdl_context.event_pump().expect("Failed to get event pump");

    let mut audio_handle = audio::init(&sdl_audio, SAMPLE_RATE);
    if let Some((device, ..)) = &mut audio_handle {
        device.resume();
    }

    let buffer_size = (width * height * 3) as usize;
    let mut framebuffer = vec![0u8; buffer_size];

    'main: loop {
        for event in event_pump.poll_iter() {
            match event {
                Event::Quit { .. } => break 'main,

                Event::KeyDown { scancode: Some(Scancode::Escape), .. } => break 'main,

                Event::KeyDown { scancode: Some(sc), repeat: false, .. } => {
                    if let Some(button_id) = key_map.get(sc) {
                        machine.set_input(button_id, true);
                    }
                }

                Event::KeyUp { scancode: Some(sc), .. } => {
                    if let Some(button_id) = key_map.get(sc) {
                        machine.set_input(button_id, false);
                    }
                }

                _ => {}
            }
        }

        machine.run_frame();

        machine.render_frame(&mut framebuffer);
        video.present(&framebuffer);

        if let Some((_, ring, _)) = &audio_handle {
            let mut buf = ring.lock().unwrap();
            for &(l, r) in machine.inner().audio_samples() {
                buf.push_back(l);
                buf.push_back(r);
            }
        }

        // Frame timing handled by VSync (set in Video::new via present_vsync)
    }

    if let Some((_, _, fade_out)) = &audio_handle {
        fade_out.store(true, Ordering::Relaxed);
        std::thread::sleep(audio::fade_out_duration());
    }
}
