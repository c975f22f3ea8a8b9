use sched_core::{Catalog, Difficulty, Schedule};
use tracing::{debug, info, warn};
use types::{Classroom, Lesson, PlacementReport, Shortfall, Subject, Teacher, TimeSlot, LESSONS_PER_DAY};

const BASE_SCORE: i32 = 100;
const HARD_PRIME_BONUS: i32 = 30;
const LIGHT_AFTERNOON_BONUS: i32 = 10;
const FIRST_LESSON_PENALTY: i32 = 10;
const LAST_LESSON_PENALTY: i32 = 20;
const DAY_LOAD_PENALTY: i32 = 2;

/// Greedy placement of mandatory curriculum hours into the free slots of a schedule.
pub struct MandatoryPlacer<'a> {
    catalog: &'a Catalog,
    difficulty: &'a dyn Difficulty,
}

impl<'a> MandatoryPlacer<'a> {
    pub fn new(catalog: &'a Catalog, difficulty: &'a dyn Difficulty) -> Self {
        Self {
            catalog,
            difficulty,
        }
    }

    /// Mandatory subjects, most hours first, hard subjects first among equals.
    pub fn ordered_subjects(&self) -> Vec<&'a Subject> {
        let mut subjects: Vec<&Subject> = self.catalog.mandatory_subjects().collect();
        subjects.sort_by(|a, b| {
            b.hours_per_week.cmp(&a.hours_per_week).then_with(|| {
                self.difficulty
                    .is_hard(&b.name)
                    .cmp(&self.difficulty.is_hard(&a.name))
            })
        });
        subjects
    }

    pub fn place_all(&self, schedule: &mut Schedule) -> PlacementReport {
        let subjects = self.ordered_subjects();
        info!("placing {} mandatory subjects", subjects.len());

        let mut report = PlacementReport::default();
        for subject in subjects {
            let placed = self.place_subject(schedule, subject);
            report.placed += placed.min(subject.hours_per_week);
            report.required += subject.hours_per_week;

            if placed < subject.hours_per_week {
                warn!(
                    subject = %subject.name,
                    placed,
                    required = subject.hours_per_week,
                    "subject placed partially"
                );
                report.shortfalls.push(Shortfall {
                    subject: subject.name.clone(),
                    class: subject.primary_class().unwrap_or_default().to_string(),
                    placed,
                    required: subject.hours_per_week,
                });
            }
        }

        info!(
            placed = report.placed,
            required = report.required,
            shortfalls = report.shortfalls.len(),
            "mandatory placement finished"
        );
        report
    }

    /// Places one subject and returns how many of its lessons the schedule
    /// holds afterwards, counting ones that were already there.
    pub fn place_subject(&self, schedule: &mut Schedule, subject: &Subject) -> u32 {
        let Some(class) = subject.primary_class() else {
            warn!(subject = %subject.name, "subject has no target class");
            return 0;
        };
        let Some(teacher) = self.catalog.teacher(&subject.teacher) else {
            warn!(subject = %subject.name, teacher = %subject.teacher, "unknown teacher");
            return 0;
        };

        let mut placed = schedule.placed_count(&subject.name, &teacher.name, class);
        if placed >= subject.hours_per_week {
            return placed;
        }

        let hard = self.difficulty.is_hard(&subject.name);
        // scored once per subject; availability is checked again before each placement
        let mut candidates: Vec<(i32, TimeSlot)> = TimeSlot::all()
            .filter(|&slot| !schedule.is_reserved(slot))
            .filter_map(|slot| {
                self.score(schedule, subject, teacher, hard, slot)
                    .map(|score| (score, slot))
            })
            .collect();
        candidates.sort_by(|a, b| b.0.cmp(&a.0));

        for (_, slot) in candidates {
            if placed >= subject.hours_per_week {
                break;
            }
            if !self.is_free(schedule, subject, teacher, slot) {
                continue;
            }
            let Some(room) = self.pick_classroom(schedule, teacher, slot) else {
                debug!(subject = %subject.name, %slot, "no free classroom");
                continue;
            };
            let lesson = Lesson {
                subject: subject.name.clone(),
                teacher: teacher.name.clone(),
                class_or_group: class.to_string(),
                classroom: Some(room.number.clone()),
                slot,
                exam_practice: false,
            };
            match schedule.add(lesson) {
                Ok(_) => placed += 1,
                Err(e) => warn!(subject = %subject.name, %e, "lesson rejected"),
            }
        }
        placed
    }

    /// Desirability of `slot` for a lesson of `subject`; `None` when it cannot go there.
    pub fn score(
        &self,
        schedule: &Schedule,
        subject: &Subject,
        teacher: &Teacher,
        hard: bool,
        slot: TimeSlot,
    ) -> Option<i32> {
        if !self.is_free(schedule, subject, teacher, slot) {
            return None;
        }
        let mut score = BASE_SCORE;

        if hard && sched_core::difficulty::is_prime_time(slot) {
            score += HARD_PRIME_BONUS;
        } else if !hard && slot.lesson >= 5 {
            score += LIGHT_AFTERNOON_BONUS;
        }

        if slot.lesson == 1 {
            score -= FIRST_LESSON_PENALTY;
        }
        if slot.lesson == LESSONS_PER_DAY {
            score -= LAST_LESSON_PENALTY;
        }

        score -= DAY_LOAD_PENALTY * schedule.day_load(slot.day) as i32;
        Some(score)
    }

    fn is_free(&self, schedule: &Schedule, subject: &Subject, teacher: &Teacher, slot: TimeSlot) -> bool {
        teacher.is_available(slot.day)
            && !schedule.is_teacher_busy(&teacher.name, slot)
            && !subject
                .classes
                .iter()
                .any(|c| schedule.is_class_busy(c, slot))
    }

    fn pick_classroom(&self, schedule: &Schedule, teacher: &Teacher, slot: TimeSlot) -> Option<&'a Classroom> {
        let catalog = self.catalog;
        teacher
            .home_classroom
            .as_ref()
            .and_then(|id| catalog.classroom(id))
            .filter(|r| !schedule.is_classroom_busy(&r.number, slot))
            .or_else(|| {
                catalog
                    .classrooms()
                    .iter()
                    .find(|r| !schedule.is_classroom_busy(&r.number, slot))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use sched_core::HardSubjects;
    use types::{DayOfWeek, DayOfWeek::*, Instance, SubjectKind};

    fn slot(day: DayOfWeek, n: u8) -> TimeSlot {
        TimeSlot::new(day, n).unwrap()
    }

    fn room(n: &str) -> Classroom {
        Classroom {
            number: n.into(),
            capacity: 30,
            floor: 1,
        }
    }

    fn teacher(name: &str, days: &[DayOfWeek], home: Option<&str>) -> Teacher {
        Teacher {
            name: name.into(),
            available_days: days.to_vec(),
            home_classroom: home.map(Into::into),
        }
    }

    fn subject(name: &str, hours: u32, teacher: &str, class: &str) -> Subject {
        Subject {
            name: name.into(),
            kind: SubjectKind::Mandatory,
            hours_per_week: hours,
            teacher: teacher.into(),
            classes: vec![class.into()],
        }
    }

    fn math_instance(hours: u32, days: &[DayOfWeek]) -> Instance {
        Instance {
            classrooms: vec![room("101")],
            teachers: vec![teacher("Иванова", days, None)],
            subjects: vec![subject("Математика", hours, "Иванова", "11А")],
            classes: vec![],
        }
    }

    fn math_reserved() -> Vec<TimeSlot> {
        let mut r = vec![slot(Mon, 1), slot(Mon, 7)];
        r.extend((1..=LESSONS_PER_DAY).map(|n| slot(Tue, n)));
        r
    }

    #[test]
    fn math_goes_to_prime_slots_outside_reserved() {
        let catalog = Catalog::new(&math_instance(4, &DayOfWeek::ALL));
        let hard = HardSubjects::default();
        let mut s = Schedule::new(math_reserved());

        let report = MandatoryPlacer::new(&catalog, &hard).place_all(&mut s);

        assert_eq!(s.len(), 4);
        assert_eq!(report.placed, 4);
        assert_eq!(report.required, 4);
        assert!(report.shortfalls.is_empty());
        for l in s.lessons() {
            assert!(!s.is_reserved(l.slot), "{} is reserved", l.slot);
            assert_ne!(l.slot.day, Tue);
            assert!((2..=4).contains(&l.slot.lesson), "{} is not prime", l.slot);
            assert_eq!(l.classroom.as_ref().unwrap().0, "101");
        }
        s.check_invariants().unwrap();
    }

    #[test]
    fn falls_back_to_later_lessons_when_prime_slots_run_out() {
        let catalog = Catalog::new(&math_instance(5, &[Mon]));
        let hard = HardSubjects::default();
        let mut s = Schedule::new(math_reserved());

        let report = MandatoryPlacer::new(&catalog, &hard).place_all(&mut s);

        let mut lessons: Vec<u8> = s.lessons().iter().map(|l| l.slot.lesson).collect();
        lessons.sort_unstable();
        assert_eq!(lessons, vec![2, 3, 4, 5, 6]);
        assert!(report.shortfalls.is_empty());
    }

    #[test]
    fn shortfall_is_required_minus_placed() {
        let catalog = Catalog::new(&math_instance(6, &[Mon]));
        let hard = HardSubjects::default();
        let mut s = Schedule::new(math_reserved());

        let report = MandatoryPlacer::new(&catalog, &hard).place_all(&mut s);

        assert_eq!(s.len(), 5);
        assert_eq!(
            report.shortfalls,
            vec![Shortfall {
                subject: "Математика".into(),
                class: "11А".into(),
                placed: 5,
                required: 6,
            }]
        );
        assert_eq!(report.shortfalls[0].missing(), 1);
        assert!((report.success_rate() - 500.0 / 6.0).abs() < 1e-9);
    }

    #[test]
    fn subjects_ordered_by_hours_then_difficulty() {
        let inst = Instance {
            classrooms: vec![room("101")],
            teachers: vec![teacher("Т", &DayOfWeek::ALL, None)],
            subjects: vec![
                subject("Музыка", 2, "Т", "5А"),
                subject("Математика", 2, "Т", "5А"),
                subject("История", 3, "Т", "5А"),
                Subject {
                    kind: SubjectKind::Elective,
                    ..subject("Кружок", 5, "Т", "5А")
                },
            ],
            classes: vec![],
        };
        let catalog = Catalog::new(&inst);
        let hard = HardSubjects::default();
        let placer = MandatoryPlacer::new(&catalog, &hard);

        let names: Vec<_> = placer
            .ordered_subjects()
            .iter()
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(names, vec!["История", "Математика", "Музыка"]);
    }

    #[test]
    fn score_follows_the_time_of_day_rules() {
        let catalog = Catalog::new(&math_instance(1, &[Mon, Wed]));
        let hard = HardSubjects::default();
        let placer = MandatoryPlacer::new(&catalog, &hard);
        let mut s = Schedule::default();
        let subj = &catalog.subjects()[0];
        let t = catalog.teacher(&"Иванова".into()).unwrap();

        assert_eq!(placer.score(&s, subj, t, true, slot(Mon, 3)), Some(130));
        assert_eq!(placer.score(&s, subj, t, true, slot(Mon, 1)), Some(90));
        assert_eq!(placer.score(&s, subj, t, true, slot(Mon, 7)), Some(80));
        assert_eq!(placer.score(&s, subj, t, false, slot(Mon, 6)), Some(110));
        assert_eq!(placer.score(&s, subj, t, false, slot(Mon, 7)), Some(90));
        assert_eq!(placer.score(&s, subj, t, true, slot(Tue, 3)), None);

        s.add(Lesson {
            subject: "Химия".into(),
            teacher: "Ершова".into(),
            class_or_group: "9А".into(),
            classroom: None,
            slot: slot(Wed, 1),
            exam_practice: false,
        })
        .unwrap();
        assert_eq!(placer.score(&s, subj, t, true, slot(Wed, 2)), Some(128));

        s.add(Lesson {
            subject: "Химия".into(),
            teacher: "Ершова".into(),
            class_or_group: "11А".into(),
            classroom: None,
            slot: slot(Wed, 3),
            exam_practice: false,
        })
        .unwrap();
        assert_eq!(placer.score(&s, subj, t, true, slot(Wed, 3)), None);
    }

    #[test]
    fn prefers_home_classroom_then_first_free() {
        let inst = Instance {
            classrooms: vec![room("101"), room("205")],
            teachers: vec![teacher("Иванова", &DayOfWeek::ALL, Some("205"))],
            subjects: vec![subject("Математика", 1, "Иванова", "11А")],
            classes: vec![],
        };
        let catalog = Catalog::new(&inst);
        let hard = HardSubjects::default();
        let placer = MandatoryPlacer::new(&catalog, &hard);
        let t = catalog.teacher(&"Иванова".into()).unwrap();

        let mut s = Schedule::default();
        s.add(Lesson {
            subject: "Химия".into(),
            teacher: "Ершова".into(),
            class_or_group: "9А".into(),
            classroom: Some("205".into()),
            slot: slot(Mon, 2),
            exam_practice: false,
        })
        .unwrap();

        assert_eq!(placer.pick_classroom(&s, t, slot(Mon, 2)).unwrap().number.0, "101");
        assert_eq!(placer.pick_classroom(&s, t, slot(Mon, 3)).unwrap().number.0, "205");
    }

    #[test]
    fn missing_classrooms_turn_into_shortfall() {
        let mut inst = math_instance(3, &DayOfWeek::ALL);
        inst.classrooms.clear();
        let catalog = Catalog::new(&inst);
        let hard = HardSubjects::default();
        let mut s = Schedule::default();

        let report = MandatoryPlacer::new(&catalog, &hard).place_all(&mut s);

        assert!(s.is_empty());
        assert_eq!(report.shortfalls[0].placed, 0);
        assert_eq!(report.shortfalls[0].required, 3);
    }

    #[test]
    fn lessons_already_present_count_toward_hours() {
        let catalog = Catalog::new(&math_instance(4, &DayOfWeek::ALL));
        let hard = HardSubjects::default();
        let existing = |d, n| Lesson {
            subject: "Математика".into(),
            teacher: "Иванова".into(),
            class_or_group: "11А".into(),
            classroom: None,
            slot: slot(d, n),
            exam_practice: false,
        };
        let mut s = Schedule::from_base([existing(Fri, 2), existing(Fri, 3)], []).unwrap();

        let report = MandatoryPlacer::new(&catalog, &hard).place_all(&mut s);

        assert_eq!(s.len(), 4);
        assert_eq!(s.placed_count("Математика", &"Иванова".into(), "11А"), 4);
        assert_eq!(report.placed, 4);
    }

    #[test]
    fn respects_teacher_availability_and_busy_classes() {
        let catalog = Catalog::new(&math_instance(3, &[Wed]));
        let hard = HardSubjects::default();
        let mut exam = Lesson {
            subject: "Практикум ЕГЭ".into(),
            teacher: "Орлова".into(),
            class_or_group: "11А".into(),
            classroom: None,
            slot: slot(Wed, 2),
            exam_practice: true,
        };
        let mut s = Schedule::from_base([exam.clone()], [slot(Wed, 2)]).unwrap();
        exam.slot = slot(Wed, 3);
        s.add(exam).unwrap();

        MandatoryPlacer::new(&catalog, &hard).place_all(&mut s);

        let placed: Vec<_> = s
            .lessons()
            .iter()
            .filter(|l| !l.exam_practice)
            .map(|l| l.slot)
            .collect();
        assert_eq!(placed, vec![slot(Wed, 4), slot(Wed, 5), slot(Wed, 6)]);
    }

    fn arb_case() -> impl Strategy<Value = (Instance, Vec<TimeSlot>)> {
        let teachers = proptest::collection::vec(
            (proptest::collection::vec(0..5usize, 0..5), proptest::option::of(0..3usize)),
            1..4,
        );
        let subjects = proptest::collection::vec((1..6u32, 0..4usize, 0..4usize, any::<bool>()), 1..10);
        let reserved = proptest::collection::vec(0..types::SLOTS_PER_WEEK, 0..12);
        (teachers, subjects, reserved, 1..4usize).prop_map(|(ts, ss, rs, rooms)| {
            let teachers: Vec<Teacher> = ts
                .iter()
                .enumerate()
                .map(|(i, (days, home))| Teacher {
                    name: format!("t{i}").as_str().into(),
                    available_days: days.iter().map(|&d| DayOfWeek::ALL[d]).collect(),
                    home_classroom: home.map(|h| format!("r{h}").as_str().into()),
                })
                .collect();
            let subjects = ss
                .iter()
                .enumerate()
                .map(|(i, &(hours, t, c, math))| Subject {
                    name: if math { format!("Математика {i}") } else { format!("Труд {i}") },
                    kind: SubjectKind::Mandatory,
                    hours_per_week: hours,
                    teacher: teachers[t % teachers.len()].name.clone(),
                    classes: vec![format!("c{c}")],
                })
                .collect();
            let inst = Instance {
                classrooms: (0..rooms).map(|r| room(&format!("r{r}"))).collect(),
                teachers,
                subjects,
                classes: vec![],
            };
            (inst, rs.into_iter().map(TimeSlot::from_index).collect())
        })
    }

    proptest! {
        #[test]
        fn prop_placement_keeps_hard_constraints((inst, reserved) in arb_case()) {
            let catalog = Catalog::new(&inst);
            let hard = HardSubjects::default();
            let mut s = Schedule::new(reserved.clone());

            let report = MandatoryPlacer::new(&catalog, &hard).place_all(&mut s);

            prop_assert!(s.check_invariants().is_ok());
            for l in s.lessons() {
                prop_assert!(!reserved.contains(&l.slot));
            }
            let mut placed_total = 0;
            for subj in &inst.subjects {
                let count = s.placed_count(&subj.name, &subj.teacher, &subj.classes[0]);
                prop_assert!(count <= subj.hours_per_week);
                placed_total += count;
                let shortfall = report.shortfalls.iter().find(|f| f.subject == subj.name);
                if count < subj.hours_per_week {
                    let f = shortfall.unwrap();
                    prop_assert_eq!(f.placed, count);
                    prop_assert_eq!(f.missing(), subj.hours_per_week - count);
                } else {
                    prop_assert!(shortfall.is_none());
                }
            }
            prop_assert_eq!(report.placed, placed_total);
            prop_assert_eq!(s.len() as u32, placed_total);
        }
    }
}
