/*
 Copyright (c) 2025 Mark Hughes

 This program is free software: you can redistribute it and/or modify
 it under the terms of the GNU Affero General Public License as published by
 the Free Software Foundation, either version 3 of the License, or
 (at your option) any later version.

 This program is distributed in the hope that it will be useful,
 but WITHOUT ANY WARRANTY; without even the implied warranty of
 MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 GNU Affero General Public License for more details.

 You should have received a copy of the GNU Affero General Public License
 along with this program. If not, see <https://www.gnu.org/licenses/>.
*/

use parking_lot::Mutex;

use crate::contact::ContactForm;

/// Contact form submissions made while the site could not be reached,
/// waiting for a background sync
#[derive(Default)]
pub struct FormOutbox {
    queued: Mutex<Vec<ContactForm>>,
}

impl FormOutbox {
    pub fn new() -> FormOutbox {
        FormOutbox::default()
    }

    pub fn push(&self, form: ContactForm) {
        self.queued.lock().push(form);
    }

    pub fn len(&self) -> usize {
        self.queued.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queued.lock().is_empty()
    }

    /// Remove and return everything queued
    pub fn take_all(&self) -> Vec<ContactForm> {
        std::mem::take(&mut *self.queued.lock())
    }
}
