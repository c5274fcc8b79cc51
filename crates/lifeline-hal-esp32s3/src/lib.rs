//! ESP32-S3 board support for the Lifeline transmitter and receiver.

#![no_std]

pub mod input {
    pub mod button;
    pub mod keypad;
    pub mod serial;
}

pub mod network;

pub mod platform {
    pub mod buzzer;
    pub mod display;
}

pub mod radio {
    pub mod lora;
}

pub mod render;

pub mod storage {
    pub mod flash_credentials;
}
