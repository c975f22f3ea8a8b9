use std::collections::{HashMap, HashSet};
use thiserror::Error;
use types::{
    ClassroomId, DayOfWeek, Lesson, TeacherId, TimeSlot, DAYS_PER_WEEK, LESSONS_PER_DAY,
    SLOTS_PER_WEEK,
};

/// Index of a lesson inside a [`Schedule`] arena.
pub type LessonIdx = usize;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum Conflict {
    #[error("slot {0} is outside the school day")]
    InvalidSlot(TimeSlot),
    #[error("slot {0} is reserved for exam practice")]
    Reserved(TimeSlot),
    #[error("teacher {teacher} is already busy at {slot}")]
    TeacherBusy { teacher: TeacherId, slot: TimeSlot },
    #[error("class {class} is already busy at {slot}")]
    ClassBusy { class: String, slot: TimeSlot },
    #[error("classroom {classroom} is already busy at {slot}")]
    ClassroomBusy { classroom: ClassroomId, slot: TimeSlot },
    #[error("no lesson with index {0}")]
    UnknownLesson(LessonIdx),
    #[error("snapshot holds {found} slots but the schedule has {expected} lessons")]
    SnapshotMismatch { expected: usize, found: usize },
}

/// Weekly occupancy of one teacher, class or classroom.
#[derive(Clone, Debug)]
struct Agenda([Option<LessonIdx>; SLOTS_PER_WEEK]);

impl Default for Agenda {
    fn default() -> Self {
        Self([None; SLOTS_PER_WEEK])
    }
}

impl Agenda {
    /// Nothing ever occupies a slot outside the school day.
    fn at(&self, slot: TimeSlot) -> Option<LessonIdx> {
        if !slot.is_valid() {
            return None;
        }
        self.0[slot.index()]
    }

    fn set(&mut self, slot: TimeSlot, idx: Option<LessonIdx>) {
        self.0[slot.index()] = idx;
    }

    fn lessons(&self) -> impl Iterator<Item = LessonIdx> + '_ {
        self.0.iter().flatten().copied()
    }

    fn gaps(&self) -> u32 {
        self.0
            .chunks(LESSONS_PER_DAY as usize)
            .map(|day| {
                let first = day.iter().position(Option::is_some);
                let last = day.iter().rposition(Option::is_some);
                match (first, last) {
                    (Some(f), Some(l)) => day[f..=l].iter().filter(|x| x.is_none()).count() as u32,
                    _ => 0,
                }
            })
            .sum()
    }
}

/// Placed lessons plus per-entity occupancy.
///
/// Every mutation keeps the hard constraints: one lesson per teacher, class
/// and classroom per slot, and no regular lesson inside a reserved slot.
/// Exam-practice lessons are what fills the reserved slots and may sit there.
#[derive(Clone, Debug, Default)]
pub struct Schedule {
    lessons: Vec<Lesson>,
    reserved: HashSet<TimeSlot>,
    teachers: HashMap<TeacherId, Agenda>,
    classes: HashMap<String, Agenda>,
    rooms: HashMap<ClassroomId, Agenda>,
    day_load: [u32; DAYS_PER_WEEK],
}

impl Schedule {
    pub fn new(reserved: impl IntoIterator<Item = TimeSlot>) -> Self {
        Self {
            reserved: reserved.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Builds a schedule pre-populated by the upstream phase.
    pub fn from_base(
        base: impl IntoIterator<Item = Lesson>,
        reserved: impl IntoIterator<Item = TimeSlot>,
    ) -> Result<Self, Conflict> {
        let mut s = Self::new(reserved);
        for lesson in base {
            s.add(lesson)?;
        }
        Ok(s)
    }

    pub fn lessons(&self) -> &[Lesson] {
        &self.lessons
    }

    pub fn lesson(&self, idx: LessonIdx) -> Option<&Lesson> {
        self.lessons.get(idx)
    }

    pub fn into_lessons(self) -> Vec<Lesson> {
        self.lessons
    }

    pub fn len(&self) -> usize {
        self.lessons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lessons.is_empty()
    }

    pub fn reserved(&self) -> &HashSet<TimeSlot> {
        &self.reserved
    }

    pub fn is_reserved(&self, slot: TimeSlot) -> bool {
        self.reserved.contains(&slot)
    }

    pub fn is_teacher_busy(&self, teacher: &TeacherId, slot: TimeSlot) -> bool {
        self.teachers
            .get(teacher)
            .is_some_and(|a| a.at(slot).is_some())
    }

    pub fn is_class_busy(&self, class: &str, slot: TimeSlot) -> bool {
        self.classes.get(class).is_some_and(|a| a.at(slot).is_some())
    }

    pub fn is_classroom_busy(&self, classroom: &ClassroomId, slot: TimeSlot) -> bool {
        self.rooms.get(classroom).is_some_and(|a| a.at(slot).is_some())
    }

    pub fn teacher_gaps(&self, teacher: &TeacherId) -> u32 {
        self.teachers.get(teacher).map_or(0, Agenda::gaps)
    }

    pub fn class_gaps(&self, class: &str) -> u32 {
        self.classes.get(class).map_or(0, Agenda::gaps)
    }

    pub fn total_teacher_gaps(&self) -> u32 {
        self.teachers.values().map(Agenda::gaps).sum()
    }

    pub fn total_class_gaps(&self) -> u32 {
        self.classes.values().map(Agenda::gaps).sum()
    }

    /// Teachers that have at least one lesson.
    pub fn teachers(&self) -> impl Iterator<Item = &TeacherId> {
        self.teachers
            .iter()
            .filter(|(_, a)| a.lessons().next().is_some())
            .map(|(t, _)| t)
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.classes
            .iter()
            .filter(|(_, a)| a.lessons().next().is_some())
            .map(|(c, _)| c.as_str())
    }

    pub fn day_load(&self, day: DayOfWeek) -> u32 {
        self.day_load[day.index()]
    }

    pub fn lessons_of_teacher<'s>(&'s self, teacher: &TeacherId) -> impl Iterator<Item = &'s Lesson> + 's {
        self.agenda_lessons(self.teachers.get(teacher))
    }

    pub fn lessons_of_class<'s>(&'s self, class: &str) -> impl Iterator<Item = &'s Lesson> + 's {
        self.agenda_lessons(self.classes.get(class))
    }

    pub fn lessons_in_classroom<'s>(
        &'s self,
        classroom: &ClassroomId,
    ) -> impl Iterator<Item = &'s Lesson> + 's {
        self.agenda_lessons(self.rooms.get(classroom))
    }

    fn agenda_lessons<'s>(&'s self, agenda: Option<&'s Agenda>) -> impl Iterator<Item = &'s Lesson> + 's {
        agenda
            .into_iter()
            .flat_map(|a| a.lessons())
            .map(move |i| &self.lessons[i])
    }

    /// Regular (non exam-practice) lessons of `subject` for `teacher` and `class`.
    pub fn placed_count(&self, subject: &str, teacher: &TeacherId, class: &str) -> u32 {
        self.lessons_of_teacher(teacher)
            .filter(|l| !l.exam_practice && l.subject == subject && l.class_or_group == class)
            .count() as u32
    }

    pub fn add(&mut self, lesson: Lesson) -> Result<LessonIdx, Conflict> {
        self.check_placement(&lesson, lesson.slot, &[])?;
        let idx = self.lessons.len();
        self.lessons.push(lesson);
        self.occupy(idx);
        Ok(idx)
    }

    /// Fails with the first conflict exchanging the slots of `a` and `b` would cause.
    pub fn check_swap(&self, a: LessonIdx, b: LessonIdx) -> Result<(), Conflict> {
        let la = self.lessons.get(a).ok_or(Conflict::UnknownLesson(a))?;
        let lb = self.lessons.get(b).ok_or(Conflict::UnknownLesson(b))?;
        self.check_placement(la, lb.slot, &[a, b])?;
        self.check_placement(lb, la.slot, &[a, b])
    }

    pub fn can_swap(&self, a: LessonIdx, b: LessonIdx) -> bool {
        self.check_swap(a, b).is_ok()
    }

    pub fn swap_slots(&mut self, a: LessonIdx, b: LessonIdx) -> Result<(), Conflict> {
        self.check_swap(a, b)?;
        if a == b {
            return Ok(());
        }
        self.vacate(a);
        self.vacate(b);
        let slot_a = self.lessons[a].slot;
        self.lessons[a].slot = self.lessons[b].slot;
        self.lessons[b].slot = slot_a;
        self.occupy(a);
        self.occupy(b);
        Ok(())
    }

    /// The slot of every lesson, by index. Cheap snapshot for [`Self::restore_slots`].
    pub fn slot_assignment(&self) -> Vec<TimeSlot> {
        self.lessons.iter().map(|l| l.slot).collect()
    }

    pub fn restore_slots(&mut self, slots: &[TimeSlot]) -> Result<(), Conflict> {
        if slots.len() != self.lessons.len() {
            return Err(Conflict::SnapshotMismatch {
                expected: self.lessons.len(),
                found: slots.len(),
            });
        }
        if let Some(&bad) = slots.iter().find(|s| !s.is_valid()) {
            return Err(Conflict::InvalidSlot(bad));
        }
        for (lesson, &slot) in self.lessons.iter_mut().zip(slots) {
            lesson.slot = slot;
        }
        self.teachers.clear();
        self.classes.clear();
        self.rooms.clear();
        self.day_load = [0; DAYS_PER_WEEK];
        for idx in 0..self.lessons.len() {
            self.occupy(idx);
        }
        debug_assert!(self.check_invariants().is_ok());
        Ok(())
    }

    /// Re-derives the whole aggregate and reports the first broken constraint.
    pub fn check_invariants(&self) -> Result<(), Conflict> {
        let mut fresh = Schedule::new(self.reserved.iter().copied());
        for lesson in &self.lessons {
            fresh.add(lesson.clone())?;
        }
        Ok(())
    }

    fn check_placement(
        &self,
        lesson: &Lesson,
        slot: TimeSlot,
        ignore: &[LessonIdx],
    ) -> Result<(), Conflict> {
        if !slot.is_valid() {
            return Err(Conflict::InvalidSlot(slot));
        }
        if !lesson.exam_practice && self.reserved.contains(&slot) {
            return Err(Conflict::Reserved(slot));
        }
        let taken = |agenda: Option<&Agenda>| {
            agenda
                .and_then(|a| a.at(slot))
                .is_some_and(|i| !ignore.contains(&i))
        };
        if taken(self.teachers.get(&lesson.teacher)) {
            return Err(Conflict::TeacherBusy {
                teacher: lesson.teacher.clone(),
                slot,
            });
        }
        if taken(self.classes.get(&lesson.class_or_group)) {
            return Err(Conflict::ClassBusy {
                class: lesson.class_or_group.clone(),
                slot,
            });
        }
        if let Some(room) = &lesson.classroom {
            if taken(self.rooms.get(room)) {
                return Err(Conflict::ClassroomBusy {
                    classroom: room.clone(),
                    slot,
                });
            }
        }
        Ok(())
    }

    fn occupy(&mut self, idx: LessonIdx) {
        let Self {
            lessons,
            teachers,
            classes,
            rooms,
            day_load,
            ..
        } = self;
        let lesson = &lessons[idx];
        let slot = lesson.slot;
        teachers
            .entry(lesson.teacher.clone())
            .or_default()
            .set(slot, Some(idx));
        classes
            .entry(lesson.class_or_group.clone())
            .or_default()
            .set(slot, Some(idx));
        if let Some(room) = &lesson.classroom {
            rooms.entry(room.clone()).or_default().set(slot, Some(idx));
        }
        day_load[slot.day.index()] += 1;
    }

    fn vacate(&mut self, idx: LessonIdx) {
        let Self {
            lessons,
            teachers,
            classes,
            rooms,
            day_load,
            ..
        } = self;
        let lesson = &lessons[idx];
        let slot = lesson.slot;
        if let Some(a) = teachers.get_mut(&lesson.teacher) {
            a.set(slot, None);
        }
        if let Some(a) = classes.get_mut(&lesson.class_or_group) {
            a.set(slot, None);
        }
        if let Some(a) = lesson.classroom.as_ref().and_then(|r| rooms.get_mut(r)) {
            a.set(slot, None);
        }
        day_load[slot.day.index()] -= 1;
    }
}
